//! Print menu plan totals and how they compare to their standard
//!
//! Usage: `plan_summary <plan-id | YYYY-MM-DD | YYYY-MM-DD..YYYY-MM-DD> [...]`

use menuplan::models::RangeStatus;
use menuplan::tools::menu_plans::{self, PlanDetail};

fn status_mark(status: RangeStatus) -> &'static str {
    match status {
        RangeStatus::Below => "below",
        RangeStatus::Within => "ok",
        RangeStatus::Above => "above",
    }
}

fn print_plan(plan: &PlanDetail) {
    println!("Plan #{} - {} ({})", plan.id, plan.date, plan.standard.label);
    if let Some(notes) = &plan.notes {
        println!("  Notes: {}", notes);
    }
    for item in &plan.items {
        println!(
            "  - {} [{}] {}",
            item.detail.recipe_name, item.detail.recipe_category.label(), item.totals.energy
        );
    }
    let s = &plan.standard;
    let t = &plan.totals_display;
    let e = &plan.evaluation;
    println!("  Energy:       {:>14}  range {}  {}", t.energy, s.energy_range, status_mark(e.energy));
    println!("  Protein:      {:>14}  range {}  {}", t.protein, s.protein_range, status_mark(e.protein));
    println!("  Fat:          {:>14}  range {}  {}", t.fat, s.fat_range, status_mark(e.fat));
    println!("  Carbohydrate: {:>14}  range {}  {}", t.carbohydrate, s.carbohydrate_range, status_mark(e.carbohydrate));
    println!("  Meets standard: {}", if plan.meets_standard { "yes" } else { "no" });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: plan_summary <plan-id | YYYY-MM-DD | YYYY-MM-DD..YYYY-MM-DD> [...]");
        std::process::exit(2);
    }

    let db_path = menuplan::config::database_path();
    println!("Database path: {}", db_path.display());

    let database = menuplan::db::Database::new(&db_path)?;

    database.with_conn(|conn| {
        menuplan::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let mut plan_ids = Vec::new();
    for arg in &args {
        if let Ok(id) = arg.parse::<i64>() {
            plan_ids.push(id);
            continue;
        }
        let (start, end) = match arg.split_once("..") {
            Some((start, end)) => (menu_plans::validate_date(start)?, menu_plans::validate_date(end)?),
            None => {
                let date = menu_plans::validate_date(arg)?;
                (date.clone(), date)
            }
        };
        let listed = menu_plans::list_menu_plans(&database, Some(&start), Some(&end), None, "asc", 200, 0)?;
        if listed.plans.is_empty() {
            println!("No plans for {}", arg);
        }
        plan_ids.extend(listed.plans.iter().map(|p| p.id));
    }

    for id in plan_ids {
        match menu_plans::get_menu_plan(&database, id)? {
            Some(plan) => print_plan(&plan),
            None => println!("Plan #{} not found", id),
        }
        println!();
    }

    Ok(())
}
