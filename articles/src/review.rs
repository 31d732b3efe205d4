use crate::Result;
use crate::console::Console;
use crate::plan::{Plan, PlanGenerator};
use colored::Colorize;
use tracing::info;

/// Shows the plan until the user declines to edit it. Every accepted edit
/// round regenerates the plan exactly once.
pub async fn review(
    console: &dyn Console,
    planner: &PlanGenerator,
    headline: &str,
    information: &str,
    mut plan: Plan,
) -> Result<Plan> {
    let mut rounds = 0;

    loop {
        console.print(&format!("\n{}\n", "--- Proposed Plan ---".bold().green()));
        console.print(&plan.render());

        if !console.confirm(
            &"Do you want to make any edits to this plan?".yellow().to_string(),
            false,
        )? {
            break;
        }

        let edits = console.ask("Please describe your edits", None)?;
        rounds += 1;
        plan = planner.generate(headline, information, Some(&edits)).await?;
    }

    info!(rounds, sections = plan.len(), "plan approved");
    console.print(&format!("\n{}\n", "Final Plan Accepted".bold().magenta()));
    console.print(&plan.render());

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Section;
    use crate::testing::{ScriptedConsole, ScriptedLLM};
    use agent::llm::Message;

    fn initial_plan() -> Plan {
        Plan(vec![Section {
            name: "Introduction".to_string(),
            description: "Why EVs matter".to_string(),
        }])
    }

    #[tokio::test]
    async fn test_decline_returns_plan_unchanged() -> Result<()> {
        let console = ScriptedConsole::new(&[], &[false]);
        let llm = ScriptedLLM::replying(&[]);
        let planner = PlanGenerator::new(llm.clone());

        let approved = review(&*console, &planner, "EVs", "info", initial_plan()).await?;

        assert_eq!(approved, initial_plan());
        assert_eq!(llm.calls(), 0);
        assert_eq!(console.asked.lock().unwrap().len(), 1);
        assert!(console.printed().contains("1. Introduction\n   Why EVs matter"));
        Ok(())
    }

    #[tokio::test]
    async fn test_each_edit_round_regenerates_once() -> Result<()> {
        let console = ScriptedConsole::new(
            &["add a battery section", "shorter names"],
            &[true, true, false],
        );
        let llm = ScriptedLLM::replying(&[
            r#"[{"name": "Introduction", "description": "d"}, {"name": "Batteries", "description": "d"}]"#,
            r#"[{"name": "Intro", "description": "d"}, {"name": "Cells", "description": "d"}]"#,
        ]);
        let planner = PlanGenerator::new(llm.clone());

        let approved = review(&*console, &planner, "EVs", "info", initial_plan()).await?;

        assert_eq!(llm.calls(), 2);
        assert_eq!(approved.sections()[1].name, "Cells");

        let requests = llm.requests();
        assert!(matches!(
            &requests[0][0],
            Message::System(s) if s.contains("add a battery section")
        ));
        assert!(matches!(
            &requests[1][0],
            Message::System(s) if s.contains("shorter names") && !s.contains("battery")
        ));
        Ok(())
    }
}
