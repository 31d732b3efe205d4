use crate::Result;
use crate::console::ProgressView;
use crate::plan::Plan;
use crate::section::SectionWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionProgress {
    pub index: usize,
    pub name: String,
    pub completed: usize,
    pub total: usize,
}

/// Writes every section of the plan concurrently and waits for all of them.
/// Drafts are returned in plan order whatever order they finish in. The first
/// failure is returned and the remaining tasks are aborted.
pub async fn fan_out(
    plan: &Plan,
    writer: Arc<dyn SectionWriter>,
    progress: mpsc::UnboundedSender<SectionProgress>,
) -> Result<Vec<String>> {
    let total = plan.len();
    let completed = Arc::new(AtomicUsize::new(0));
    let mut tasks = JoinSet::new();

    info!(sections = total, "dispatching section writers");
    for (index, section) in plan.sections().iter().cloned().enumerate() {
        let writer = writer.clone();
        let completed = completed.clone();
        let progress = progress.clone();

        tasks.spawn(async move {
            let text = writer.write(&section).await?;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(section = %section.name, done, total, "section finished");
            // a closed receiver only means nobody is rendering progress
            let _ = progress.send(SectionProgress {
                index,
                name: section.name,
                completed: done,
                total,
            });
            Result::Ok((index, text))
        });
    }
    drop(progress);

    let mut drafts: Vec<Option<String>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let (index, text) = joined??;
        drafts[index] = Some(text);
    }

    Ok(drafts.into_iter().flatten().collect())
}

/// Single consumer of progress events. Resolves to the number of events seen
/// once every sender is dropped.
pub fn render_progress(
    mut view: Box<dyn ProgressView>,
    mut events: mpsc::UnboundedReceiver<SectionProgress>,
) -> JoinHandle<Result<usize>> {
    tokio::spawn(async move {
        let mut seen = 0;
        while let Some(event) = events.recv().await {
            debug!(
                index = event.index,
                completed = event.completed,
                total = event.total,
                "progress"
            );
            view.advance(&event.name)?;
            seen += 1;
        }
        view.finish()?;
        Ok(seen)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::plan::Section;
    use crate::testing::ScriptedConsole;
    use crate::console::Console;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Later sections finish first.
    struct ReversedWriter {
        total: u64,
    }

    #[async_trait]
    impl SectionWriter for ReversedWriter {
        async fn write(&self, section: &Section) -> Result<String> {
            let position: u64 = section.description.parse().unwrap();
            tokio::time::sleep(Duration::from_millis((self.total - position) * 15)).await;
            Ok(format!("draft of {}", section.name))
        }
    }

    struct FailingWriter;

    #[async_trait]
    impl SectionWriter for FailingWriter {
        async fn write(&self, section: &Section) -> Result<String> {
            if section.name == "S2" {
                return Err(Error::MalformedPlan("no".to_string()));
            }
            Ok(section.name.clone())
        }
    }

    fn plan(n: usize) -> Plan {
        Plan(
            (0..n)
                .map(|i| Section {
                    name: format!("S{}", i),
                    description: i.to_string(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_barrier_and_plan_order() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let drafts = fan_out(&plan(5), Arc::new(ReversedWriter { total: 5 }), tx).await?;

        assert_eq!(
            drafts,
            (0..5).map(|i| format!("draft of S{}", i)).collect::<Vec<_>>()
        );

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert_eq!(
            events.iter().map(|e| e.completed).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        assert!(events.iter().all(|e| e.total == 5));
        // completion order differs from plan order
        assert_eq!(events[0].name, "S4");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_plan() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let drafts = fan_out(&plan(0), Arc::new(FailingWriter), tx).await?;
        assert!(drafts.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_aborts_fan_out() {
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = fan_out(&plan(4), Arc::new(FailingWriter), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedPlan(_)));
    }

    #[tokio::test]
    async fn test_render_progress_consumes_all_events() -> Result<()> {
        let console = ScriptedConsole::new(&[], &[]);
        let (tx, rx) = mpsc::unbounded_channel();
        let renderer = render_progress(console.progress("Writing sections...", 3), rx);

        let drafts = fan_out(&plan(3), Arc::new(ReversedWriter { total: 3 }), tx).await?;

        assert_eq!(renderer.await??, 3);
        assert_eq!(drafts.len(), 3);
        let mut labels = console.progress.lock().unwrap().clone();
        labels.sort();
        assert_eq!(labels, vec!["S0", "S1", "S2"]);
        Ok(())
    }
}
