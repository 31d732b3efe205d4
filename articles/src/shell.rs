use crate::Result;
use crate::article::Article;
use crate::console::Console;
use crate::fanout::{fan_out, render_progress};
use crate::panel::panel;
use crate::plan::PlanGenerator;
use crate::review::review;
use crate::search::{SearchCapability, SearchResult};
use crate::section::SectionWriter;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The user stopped after seeing the search results.
    Declined,
    Completed {
        article: Article,
        saved: Option<PathBuf>,
    },
}

/// Top-level interactive flow: topic, search, plan review, writing, saving.
pub struct Shell {
    console: Arc<dyn Console>,
    search: Arc<dyn SearchCapability>,
    planner: PlanGenerator,
    writer: Arc<dyn SectionWriter>,
    output_dir: PathBuf,
}

impl Shell {
    pub fn new(
        console: Arc<dyn Console>,
        search: Arc<dyn SearchCapability>,
        planner: PlanGenerator,
        writer: Arc<dyn SectionWriter>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            console,
            search,
            planner,
            writer,
            output_dir,
        }
    }

    pub async fn run(&self) -> Result<Outcome> {
        self.display_title();

        let content = self
            .console
            .ask("Enter the content you need to write about", None)?;
        let language = self
            .console
            .ask("Enter the language for your article", Some("english"))?;
        info!(%content, %language, "starting session");

        self.console
            .print(&format!("\n{}", "Searching for information...".bold().green()));
        let research = self.search.search(&content, &language).await?;
        self.display_search_results(&research);

        let outcome = if self.console.confirm(
            "Would you like to generate an article based on this information?",
            false,
        )? {
            let article = self.write_article(&research).await?;
            self.display_article(&article);
            let saved = self.save_article(&article)?;
            Outcome::Completed { article, saved }
        } else {
            info!("article generation declined");
            Outcome::Declined
        };

        self.console.print(
            &"Thank you for using the articles writer!"
                .bold()
                .blue()
                .to_string(),
        );
        Ok(outcome)
    }

    async fn write_article(&self, research: &SearchResult) -> Result<Article> {
        self.console.print(&format!(
            "\n{}",
            "Planning for Article Generation Process".bold().green()
        ));

        let plan = self
            .planner
            .generate(&research.headline, &research.details, None)
            .await?;
        let plan = review(
            &*self.console,
            &self.planner,
            &research.headline,
            &research.details,
            plan,
        )
        .await?;

        self.console.print(&format!(
            "\n{}\n",
            "Starting Article Writing process".bold().magenta()
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        let renderer = render_progress(
            self.console.progress("Writing sections...", plan.len()),
            rx,
        );
        let drafts = fan_out(&plan, self.writer.clone(), tx).await?;
        renderer.await??;

        info!(sections = drafts.len(), "article writing completed");
        Ok(Article::new(research.headline.clone(), &drafts))
    }

    fn display_title(&self) {
        self.console.print(&format!(
            "{}\n{}\n{}",
            "╭────────────────────╮".green(),
            format!("│ {} │", "AI Articles Writer".bold().blue()),
            "╰────────────────────╯".green()
        ));
    }

    fn display_search_results(&self, research: &SearchResult) {
        self.console
            .print(&format!("\n{}", "Search Results:".bold().green()));
        self.console
            .print(&format!("{} {}", "Headline:".bold(), research.headline));

        self.console.print(&format!("\n{}", "Sources:".bold()));
        for (i, source) in research.sources.iter().enumerate() {
            self.console.print(&format!(
                "{} {}\n{}\n",
                format!("Source {}:", i + 1).bold(),
                source.source,
                source.information_found.italic()
            ));
        }

        self.console.print(&panel(
            "Information Details",
            &research.details,
            colored::Color::Blue,
        ));
    }

    fn display_article(&self, article: &Article) {
        self.console.print(&format!(
            "\n{}\n",
            "Article Generation Complete!".bold().green()
        ));
        self.console.print(&panel(
            &article.headline,
            &article.body,
            colored::Color::Green,
        ));
    }

    fn save_article(&self, article: &Article) -> Result<Option<PathBuf>> {
        if !self
            .console
            .confirm("Would you like to save this article to a file?", false)?
        {
            return Ok(None);
        }

        let path = article.save(&self.output_dir)?;
        self.console.print(&format!(
            "{} {}",
            "Article saved to:".bold().green(),
            path.display()
        ));
        Ok(Some(path))
    }
}
