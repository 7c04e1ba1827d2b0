//! `ppm-finder guided`: answer the questionnaire and see the resulting ranking
//!
//! Runs interactively when no `--answer` is given and a terminal is attached.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};

use crate::finder::{render_ranking, AnalyticsSink, FinderSession, OutputFormat};

use super::SourceOptions;

#[derive(Debug, Clone, Default)]
pub struct GuidedOptions {
    pub source: SourceOptions,
    /// `question=option` answers for non-interactive runs
    pub answers: Vec<(String, String)>,
    pub format: OutputFormat,
    pub top: Option<usize>,
    /// Submit without asking
    pub yes: bool,
}

/// Parse `question=option`
pub fn parse_answer(raw: &str) -> Result<(String, String)> {
    let (question, option) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected question=option, got '{}'", raw))?;
    Ok((question.trim().to_string(), option.trim().to_string()))
}

pub fn execute_guided(options: GuidedOptions, sink: Arc<dyn AnalyticsSink>) -> Result<()> {
    let mut session = options.source.open_session(sink)?;

    let submit = if !options.answers.is_empty() {
        run_scripted(&mut session, &options.answers)?;
        true
    } else if console::user_attended() {
        run_interactive(&mut session)?;
        println!(
            "\n{}\n",
            render_ranking(session.ranking(), OutputFormat::Text, options.top.or(Some(5)))?
        );
        options.yes
            || Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Submit this ranking?")
                .default(true)
                .interact()?
    } else {
        return Err(anyhow!(
            "No terminal attached; pass answers with --answer question=option"
        ));
    };

    if !submit {
        session.abandon_guided(false)?;
        println!("{} Ranking not submitted", style("!").yellow());
        return Ok(());
    }

    let snapshot = session.submit_ranking();
    if options.format != OutputFormat::Json {
        println!("{} Guided ranking complete\n", style("✓").green());
    }
    println!("{}", render_ranking(&snapshot.ranking, options.format, options.top)?);
    Ok(())
}

/// Answer every question from `answers`, in questionnaire order
pub fn run_scripted(session: &mut FinderSession, answers: &[(String, String)]) -> Result<()> {
    for (question, _) in answers {
        if session.question_table().question(question).is_none() {
            tracing::warn!("Unknown question ID in --answer: {}", question);
        }
    }

    session.start_guided()?;
    while let Some(question) = session.current_question() {
        let question_id = question.id.clone();
        let option = answers
            .iter()
            .find(|(q, _)| *q == question_id)
            .map(|(_, o)| o.clone())
            .ok_or_else(|| anyhow!("No answer given for question '{}'", question_id))?;
        session.answer_guided(&option)?;
    }
    Ok(())
}

fn run_interactive(session: &mut FinderSession) -> Result<()> {
    let theme = ColorfulTheme::default();
    session.start_guided()?;

    while let Some(question) = session.current_question() {
        let (number, answered, total) = session
            .guided_status()
            .map(|s| (s.question_number.unwrap_or(s.total), s.answered, s.total))
            .unwrap_or_default();

        if let Some(help) = &question.help {
            println!("{}", style(help).dim());
        }
        let option_ids: Vec<String> = question.options.iter().map(|o| o.id.clone()).collect();
        let mut items: Vec<String> = question.options.iter().map(|o| o.label.clone()).collect();
        if answered > 0 {
            items.push("← Back".to_string());
        }
        let prompt = format!("[{}/{}] {}", number, total, question.prompt);

        let choice = Select::with_theme(&theme)
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()?;

        match option_ids.get(choice) {
            Some(option) => {
                session.answer_guided(option)?;
            }
            None => {
                session.guided_back()?;
            }
        }
    }
    Ok(())
}
