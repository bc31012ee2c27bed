//! Prompt assembly for spending insights and the boundary to whatever
//! generates the answer text.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use tally_domain::Book;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dashboard_service::{category_totals, CategoryTotal},
    expense_service::ExpenseService,
    query::ExpenseFilter,
};

pub const DEFAULT_RECENT_LIMIT: usize = 50;
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// What the user wants to learn from their spending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightKind {
    NextMonth,
    CategoryInsights,
    BudgetAdvice,
    Custom(String),
}

impl InsightKind {
    pub const NAMES: [&'static str; 4] =
        ["next-month", "category-insights", "budget-advice", "custom"];

    /// Parses a kind name; `custom` takes its question from `question`.
    pub fn parse(name: &str, question: Option<&str>) -> Result<Self, ParseInsightKindError> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "next-month" => Ok(InsightKind::NextMonth),
            "category-insights" => Ok(InsightKind::CategoryInsights),
            "budget-advice" => Ok(InsightKind::BudgetAdvice),
            "custom" => match question.map(str::trim).filter(|q| !q.is_empty()) {
                Some(question) => Ok(InsightKind::Custom(question.to_string())),
                None => Err(ParseInsightKindError::MissingQuestion),
            },
            _ => Err(ParseInsightKindError::Unknown(name.trim().to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InsightKind::NextMonth => "next-month",
            InsightKind::CategoryInsights => "category-insights",
            InsightKind::BudgetAdvice => "budget-advice",
            InsightKind::Custom(_) => "custom",
        }
    }
}

impl FromStr for InsightKind {
    type Err = ParseInsightKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseInsightKindError {
    #[error("unknown insight kind `{0}` (expected next-month, category-insights, budget-advice or custom)")]
    Unknown(String),
    #[error("custom insights need a question")]
    MissingQuestion,
}

/// The figures a prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightContext {
    pub total: Decimal,
    pub category_totals: Vec<CategoryTotal>,
    /// Pre-rendered `"{date}: {category} - ${amount}"` lines, newest first.
    pub recent: Vec<String>,
}

impl InsightContext {
    pub fn gather(book: &Book, user_id: Uuid, recent_limit: usize) -> Self {
        let expenses = ExpenseService::list(book, user_id, &ExpenseFilter::default());
        let total = ExpenseService::total(&expenses);

        let category_totals = category_totals(book, &expenses);

        let recent = expenses
            .iter()
            .take(recent_limit)
            .map(|expense| {
                format!(
                    "{}: {} - ${}",
                    expense.date,
                    book.category_label(expense.category_id),
                    expense.amount
                )
            })
            .collect();

        Self {
            total,
            category_totals,
            recent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightPrompt {
    pub kind: InsightKind,
    pub text: String,
}

impl InsightPrompt {
    pub fn build(kind: InsightKind, context: &InsightContext) -> Self {
        let breakdown = context
            .category_totals
            .iter()
            .map(|entry| format!("{}: ${}", entry.label, entry.total))
            .collect::<Vec<_>>()
            .join(", ");
        let recent = context.recent.join("\n");
        let figures = |total_label: &str| {
            format!(
                "{}: ${}\nCategory breakdown: {}\n\nRecent expenses:\n{}",
                total_label, context.total, breakdown, recent
            )
        };

        let text = match &kind {
            InsightKind::NextMonth => format!(
                "Based on these expense records, predict next month's spending:\n\n{}\n\n\
                 Provide a brief prediction of next month's spending with specific amounts.",
                figures("Total expenses so far")
            ),
            InsightKind::CategoryInsights => format!(
                "Analyze these expenses and provide category-wise insights:\n\n{}\n\n\
                 Which categories need attention? Provide specific recommendations.",
                figures("Total expenses")
            ),
            InsightKind::BudgetAdvice => format!(
                "Based on these expenses, provide budget recommendations:\n\n{}\n\n\
                 Suggest a realistic monthly budget and saving strategies.",
                figures("Total expenses")
            ),
            InsightKind::Custom(question) => format!(
                "Based on these expense records, answer this question: {}\n\n{}",
                question,
                figures("Total expenses")
            ),
        };
        Self { kind, text }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Backend(String),
    #[error("the generator returned no text")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Produces answer text for a prompt.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightOutcome {
    Success { html: String },
    Failure { message: String },
}

impl InsightOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InsightOutcome::Success { .. })
    }
}

pub struct InsightService;

impl InsightService {
    /// Runs `prompt` through `generator` once. `None` means no credentials are
    /// configured; `api_key_env` names the variable the user should set.
    pub fn request(
        generator: Option<&dyn TextGenerator>,
        api_key_env: &str,
        prompt: &InsightPrompt,
    ) -> InsightOutcome {
        let Some(generator) = generator else {
            tracing::warn!(api_key_env, "insight requested without credentials");
            return InsightOutcome::Failure {
                message: format!(
                    "Please set your {} environment variable to use AI predictions.",
                    api_key_env
                ),
            };
        };
        let result = generator.generate(&prompt.text).and_then(|text| {
            if text.trim().is_empty() {
                Err(GenerationError::Empty)
            } else {
                Ok(text)
            }
        });
        match result {
            Ok(text) => {
                tracing::info!(kind = prompt.kind.name(), chars = text.len(), "generated insight");
                InsightOutcome::Success {
                    html: to_html(&text),
                }
            }
            Err(err) => {
                tracing::warn!(kind = prompt.kind.name(), error = %err, "insight generation failed");
                InsightOutcome::Failure {
                    message: format!("Error generating predictions: {}", err),
                }
            }
        }
    }
}

/// Escapes markup characters and turns line breaks into `<br>`.
pub fn to_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.trim_end().chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\r' => {}
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for InsightOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightOutcome::Success { html } => f.write_str(html),
            InsightOutcome::Failure { message } => f.write_str(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct Canned(Result<&'static str, &'static str>, RefCell<Vec<String>>);

    impl TextGenerator for Canned {
        fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.1.borrow_mut().push(prompt.to_string());
            self.0
                .map(str::to_string)
                .map_err(|err| GenerationError::Backend(err.to_string()))
        }
    }

    fn context() -> InsightContext {
        InsightContext {
            total: Decimal::new(4250, 2),
            category_totals: vec![CategoryTotal {
                category_id: None,
                label: "Food".into(),
                total: Decimal::new(4250, 2),
            }],
            recent: vec!["2024-03-05: Food - $42.50".into()],
        }
    }

    #[test]
    fn parses_kinds_and_requires_question_for_custom() {
        assert_eq!(InsightKind::parse("next_month", None), Ok(InsightKind::NextMonth));
        assert_eq!("Budget-Advice".parse::<InsightKind>(), Ok(InsightKind::BudgetAdvice));
        assert_eq!(
            InsightKind::parse("custom", Some("  ")),
            Err(ParseInsightKindError::MissingQuestion)
        );
        assert_eq!(
            InsightKind::parse("custom", Some("Why so much coffee?")),
            Ok(InsightKind::Custom("Why so much coffee?".into()))
        );
        assert!(InsightKind::parse("weather", None).is_err());
    }

    #[test]
    fn prompt_carries_figures_and_instruction() {
        let prompt = InsightPrompt::build(InsightKind::NextMonth, &context());
        assert!(prompt.text.starts_with("Based on these expense records, predict next month's"));
        assert!(prompt.text.contains("Total expenses so far: $42.50"));
        assert!(prompt.text.contains("Category breakdown: Food: $42.50"));
        assert!(prompt.text.contains("2024-03-05: Food - $42.50"));

        let custom = InsightPrompt::build(InsightKind::Custom("Can I save more?".into()), &context());
        assert!(custom.text.contains("answer this question: Can I save more?"));
    }

    #[test]
    fn missing_generator_asks_for_credentials() {
        let prompt = InsightPrompt::build(InsightKind::BudgetAdvice, &context());
        let outcome = InsightService::request(None, DEFAULT_API_KEY_ENV, &prompt);
        assert_eq!(
            outcome,
            InsightOutcome::Failure {
                message: "Please set your GEMINI_API_KEY environment variable to use AI predictions."
                    .into()
            }
        );
    }

    #[test]
    fn generator_failure_is_reported_once() {
        let generator = Canned(Err("quota exhausted"), RefCell::new(Vec::new()));
        let prompt = InsightPrompt::build(InsightKind::CategoryInsights, &context());
        let outcome = InsightService::request(Some(&generator), DEFAULT_API_KEY_ENV, &prompt);
        assert_eq!(
            outcome,
            InsightOutcome::Failure {
                message: "Error generating predictions: quota exhausted".into()
            }
        );
        assert_eq!(generator.1.borrow().len(), 1);
    }

    #[test]
    fn success_is_escaped_with_line_breaks() {
        let generator = Canned(Ok("Spend <less> on food\n& save"), RefCell::new(Vec::new()));
        let prompt = InsightPrompt::build(InsightKind::NextMonth, &context());
        let outcome = InsightService::request(Some(&generator), DEFAULT_API_KEY_ENV, &prompt);
        assert_eq!(
            outcome,
            InsightOutcome::Success {
                html: "Spend &lt;less&gt; on food<br>&amp; save".into()
            }
        );
        assert_eq!(generator.1.borrow()[0], prompt.text);
    }

    #[test]
    fn blank_answer_counts_as_failure() {
        let generator = Canned(Ok("   "), RefCell::new(Vec::new()));
        let prompt = InsightPrompt::build(InsightKind::NextMonth, &context());
        let outcome = InsightService::request(Some(&generator), DEFAULT_API_KEY_ENV, &prompt);
        assert!(!outcome.is_success());
    }
}
