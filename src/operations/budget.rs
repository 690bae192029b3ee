//! Read-only budget rollups over team -> department -> item.
use rust_decimal::Decimal;

use super::auth::Scope;
use crate::models::item::Item;
use crate::models::organization::OrganizationData;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub budget: Decimal,
    pub spent: Decimal,
}

impl Totals {
    pub fn balance(&self) -> Decimal {
        self.budget - self.spent
    }

    fn add_item(&mut self, item: &Item) {
        self.budget += item.budget;
        self.spent += item.spent;
    }

    fn add(&mut self, other: &Totals) {
        self.budget += other.budget;
        self.spent += other.spent;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRollup {
    pub code: String,
    pub name: String,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentRollup {
    pub code: String,
    pub name: String,
    pub team_code: String,
    pub totals: Totals,
    pub items: Vec<ItemRollup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRollup {
    pub code: String,
    pub name: String,
    pub totals: Totals,
    pub departments: Vec<DepartmentRollup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rollup {
    pub teams: Vec<TeamRollup>,
    /// Departments whose team code resolves to no team. Only the `All` scope
    /// reports them.
    pub orphan_departments: Vec<DepartmentRollup>,
    pub totals: Totals,
}

fn department_rollup(data: &OrganizationData, code: &str) -> Option<DepartmentRollup> {
    let dept = data.department(code)?;
    let mut totals = Totals::default();
    let items = data
        .items
        .iter()
        .filter(|i| i.dept_code == dept.code)
        .map(|item| {
            totals.add_item(item);
            ItemRollup {
                code: item.code.clone(),
                name: item.name.clone(),
                totals: Totals {
                    budget: item.budget,
                    spent: item.spent,
                },
            }
        })
        .collect();
    Some(DepartmentRollup {
        code: dept.code.clone(),
        name: dept.name.clone(),
        team_code: dept.team_code.clone(),
        totals,
        items,
    })
}

/// Sums budget and spent for everything visible in `scope`.
///
/// For `All` the grand total covers every item, including items whose
/// department is missing. For a team it covers that team's departments only.
pub fn rollup(data: &OrganizationData, scope: &Scope) -> Rollup {
    let teams: Vec<TeamRollup> = data
        .teams
        .iter()
        .filter(|t| scope.includes_team(&t.code))
        .map(|team| {
            let mut totals = Totals::default();
            let departments: Vec<DepartmentRollup> = data
                .departments
                .iter()
                .filter(|d| d.team_code == team.code)
                .filter_map(|d| department_rollup(data, &d.code))
                .inspect(|d| totals.add(&d.totals))
                .collect();
            TeamRollup {
                code: team.code.clone(),
                name: team.name.clone(),
                totals,
                departments,
            }
        })
        .collect();

    let (orphan_departments, totals) = match scope {
        Scope::All => {
            let orphans = data
                .departments
                .iter()
                .filter(|d| data.team(&d.team_code).is_none())
                .filter_map(|d| department_rollup(data, &d.code))
                .collect();
            let mut totals = Totals::default();
            data.items.iter().for_each(|item| totals.add_item(item));
            (orphans, totals)
        }
        Scope::Team(_) => {
            let mut totals = Totals::default();
            teams.iter().for_each(|t| totals.add(&t.totals));
            (Vec::new(), totals)
        }
    };

    Rollup {
        teams,
        orphan_departments,
        totals,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overrun {
    pub item_code: String,
    pub item_name: String,
    pub team_name: Option<String>,
    pub department_name: Option<String>,
    pub excess: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetReport {
    pub overruns: Vec<Overrun>,
    pub totals: Totals,
}

impl BudgetReport {
    pub fn is_healthy(&self) -> bool {
        self.overruns.is_empty()
    }
}

/// Lists every in-scope item whose spending exceeds its budget.
pub fn check_budget(data: &OrganizationData, scope: &Scope) -> BudgetReport {
    let mut totals = Totals::default();
    let mut overruns = Vec::new();

    let in_scope = data.items.iter().filter(|item| match scope {
        Scope::All => true,
        Scope::Team(code) => data
            .team_of_item(item)
            .map(|t| &t.code == code)
            .unwrap_or(false),
    });

    for item in in_scope {
        totals.add_item(item);
        if item.spent > item.budget {
            let dept = data.department(&item.dept_code);
            let team = dept.and_then(|d| data.team(&d.team_code));
            overruns.push(Overrun {
                item_code: item.code.clone(),
                item_name: item.name.clone(),
                team_name: team.map(|t| t.name.clone()),
                department_name: dept.map(|d| d.name.clone()),
                excess: item.spent - item.budget,
            });
        }
    }

    BudgetReport { overruns, totals }
}
