use tally_core::{
    InsightContext, InsightKind, InsightOutcome, InsightPrompt, InsightService, TextGenerator,
};

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::io;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::insights::ExternalCommandGenerator;

use super::{split_subcommand, usage_error};

const USAGE: &[&str] = &[
    "insights prompt <next-month|category-insights|budget-advice|custom> [question]",
    "insights ask <next-month|category-insights|budget-advice|custom> [question]",
];

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "insights",
        "Build spending prompts and ask the configured assistant",
        USAGE,
        cmd_insights,
    )]
}

fn cmd_insights(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (sub, rest) = split_subcommand(args, USAGE)?;
    match sub.as_str() {
        "prompt" => {
            let prompt = build_prompt(context, rest)?;
            output::section(format!("Prompt: {}", prompt.kind.name()));
            io::print_info(prompt.text);
            Ok(())
        }
        "ask" => ask(context, rest),
        _ => Err(usage_error(USAGE)),
    }
}

fn ask(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let prompt = build_prompt(context, args)?;
    let settings = &context.config.insights;
    let generator = ExternalCommandGenerator::from_env(settings);
    let outcome = InsightService::request(
        generator.as_ref().map(|g| g as &dyn TextGenerator),
        &settings.api_key_env,
        &prompt,
    );
    match outcome {
        InsightOutcome::Success { html } => {
            output::section(format!("Insights: {}", prompt.kind.name()));
            io::print_info(html_to_text(&html));
        }
        InsightOutcome::Failure { message } => io::print_warning(message),
    }
    Ok(())
}

fn build_prompt(context: &ShellContext, args: &[&str]) -> Result<InsightPrompt, CommandError> {
    let (name, question) = match args.split_first() {
        Some((name, rest)) => (*name, (!rest.is_empty()).then(|| rest.join(" "))),
        None => return Err(usage_error(USAGE)),
    };
    let kind = InsightKind::parse(name, question.as_deref())
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
    let user_id = context.active_user_id()?;
    let gathered = InsightContext::gather(
        &context.book,
        user_id,
        context.config.insights.recent_limit,
    );
    Ok(InsightPrompt::build(kind, &gathered))
}

/// Terminal rendering of the escaped answer.
fn html_to_text(html: &str) -> String {
    html.replace("<br>", "\n")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_answers_render_as_plain_text() {
        let html = tally_core::insights::to_html("Save 10% & <review> \"dining\"\nDone");
        assert_eq!(html_to_text(&html), "Save 10% & <review> \"dining\"\nDone");
    }
}
