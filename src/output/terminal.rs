// Colored terminal output for the operator CLI.
//
// main.rs delegates all formatting here: the policy table, a strategy's
// action matrix and composed predicates.

use colored::Colorize;

use crate::filtering::composer::CombinedPredicate;
use crate::filtering::engine::PolicyConfig;
use crate::filtering::strategy::Strategy;
use crate::filtering::types::{Action, ContentType};

/// Display severity levels and thresholds.
pub fn display_policy(policy: &PolicyConfig) {
    println!("\n{}", "=== Moderation Policy ===".bold());

    println!("\n  {}", "Severity levels (strictest first):".dimmed());
    if policy.severity.levels().is_empty() {
        println!("    {}", "none configured, filtering disabled for everyone".yellow());
    }
    for (i, level) in policy.severity.levels().iter().enumerate() {
        let marker = if i == 0 { " (filters)".green() } else { "".normal() };
        println!("    {i}. {level}{marker}");
    }

    println!(
        "\n  {:<10} {:>16} {:>22}",
        "Type".dimmed(),
        "Reports to hide".dimmed(),
        "Dismissals to restore".dimmed(),
    );
    println!("  {}", "-".repeat(50).dimmed());
    for content_type in ContentType::ALL {
        match policy.thresholds.get(content_type) {
            Some(t) => println!(
                "  {:<10} {:>16} {:>22}",
                content_type.as_str(),
                t.reports_to_hide,
                t.dismissals_to_restore
            ),
            None => println!(
                "  {:<10} {}",
                content_type.as_str(),
                "not configured, never filtered".yellow()
            ),
        }
    }
    println!();
}

/// Display the (target, showing) action matrix of one viewing context.
pub fn display_strategy_table(strategy: Strategy) {
    println!("\n{}", format!("=== Strategy: {strategy} ===").bold());
    print!("\n  {:<10}", "target".dimmed());
    for showing in ContentType::ALL {
        print!(" {:<24}", format!("showing {showing}").dimmed());
    }
    println!();
    for target in ContentType::ALL {
        print!("  {:<10}", target.as_str());
        for showing in ContentType::ALL {
            let action = strategy.action(target, showing);
            print!(" {:<24}", colorize_action(action));
        }
        println!();
    }
    println!();
}

/// Display a composed WHERE clause and its parameters.
pub fn display_predicate(showing: ContentType, combined: &CombinedPredicate) {
    println!("\n{}", format!("=== Predicate for {showing} listings ===").bold());
    println!("\n  {}", "WHERE".dimmed());
    for (i, clause) in combined.predicate.split(" AND (").enumerate() {
        let clause = if i == 0 { clause.to_string() } else { format!("AND ({clause}") };
        println!("    {}", clause);
    }
    if combined.params.is_empty() {
        println!("\n  {}", "No parameters.".dimmed());
    } else {
        println!("\n  {}", "Parameters:".dimmed());
        for (name, value) in &combined.params {
            println!("    :{name} = {value}");
        }
    }
    println!();
}

fn colorize_action(action: Action) -> colored::ColoredString {
    match action {
        Action::None => action.as_str().normal(),
        Action::HideContent => action.as_str().red(),
        Action::ReplaceWithPlaceholder => action.as_str().yellow(),
    }
}
