//! Interactive chat shell on top of `ChatPage`.

use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use insights_core::pages::ChatPage;
use insights_core::render::{self, Block};
use insights_core::{ConversationFormat, PageContext, PreferenceStore, UserPreferences};

const COMMANDS: [&str; 10] = [
    "/new", "/clear", "/load", "/export", "/follow", "/sample", "/init", "/dark", "/help", "/quit",
];

const HELP: &str = "\
/new [TITLE]     start a new conversation
/clear           clear the transcript on screen
/load ID         open a stored conversation
/export FORMAT   export as json, markdown, csv or html
/follow N        ask follow-up suggestion N
/sample N        ask sample question N
/init            initialise the backend
/dark            toggle dark mode
/quit            leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Ask(String),
    New(Option<String>),
    Clear,
    Load(String),
    Export(ConversationFormat),
    FollowUp(usize),
    Sample(usize),
    Init,
    Dark,
    Help,
    Quit,
    Invalid(String),
}

/// Parse one input line. Numbers are 1-based, as printed.
pub fn parse_line(line: &str) -> Option<ShellCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(ShellCommand::Ask(line.to_string()));
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };
    let number = |what: &str| match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ShellCommand::Invalid(format!("usage: {} N", what))),
    };

    let parsed = match command {
        "/new" => ShellCommand::New(Some(arg.to_string()).filter(|t| !t.is_empty())),
        "/clear" => ShellCommand::Clear,
        "/load" if !arg.is_empty() => ShellCommand::Load(arg.to_string()),
        "/load" => ShellCommand::Invalid("usage: /load ID".to_string()),
        "/export" => match arg.parse() {
            Ok(format) => ShellCommand::Export(format),
            Err(e) => ShellCommand::Invalid(format!("{}", e)),
        },
        "/follow" => number("/follow").map_or_else(|e| e, ShellCommand::FollowUp),
        "/sample" => number("/sample").map_or_else(|e| e, ShellCommand::Sample),
        "/init" => ShellCommand::Init,
        "/dark" => ShellCommand::Dark,
        "/help" => ShellCommand::Help,
        "/quit" | "/exit" => ShellCommand::Quit,
        other => ShellCommand::Invalid(format!("unknown command {} (try /help)", other)),
    };
    Some(parsed)
}

// ============================================================================
// Line editor helper
// ============================================================================

struct ShellHelper;

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Validator for ShellHelper {}

// ============================================================================
// Loop
// ============================================================================

fn print_blocks(blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Question(_) => {}
            Block::Error(_) => println!("{}\n", block.render().red()),
            Block::System(_) => println!("{}\n", block.render().dimmed()),
            Block::Answer { .. } => println!("{}\n", block.render()),
        }
    }
}

async fn ask(page: &mut ChatPage<'_>) {
    let before = page.blocks().len();
    page.submit().await;
    print_blocks(&page.blocks()[before.min(page.blocks().len())..]);
}

pub async fn run(
    ctx: PageContext<'_>,
    prefs: UserPreferences,
    store: &mut PreferenceStore,
) -> anyhow::Result<bool> {
    let mut page = ChatPage::new(ctx, prefs);
    page.open().await;

    let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ShellHelper));

    println!("{}", "=== Cbus Financial Insights ===".bright_magenta().bold());
    println!("{}", "Ask a question, or /help for commands.".bright_black());
    println!();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let Some(command) = parse_line(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.trim());

        match command {
            ShellCommand::Ask(question) => {
                page.set_input(question);
                ask(&mut page).await;
            }
            ShellCommand::New(title) => {
                page.new_conversation(title.as_deref()).await;
            }
            ShellCommand::Clear => {
                page.clear();
            }
            ShellCommand::Load(id) => {
                if page.load_conversation(&id).await {
                    println!("{}\n", render::transcript(page.blocks()));
                }
            }
            ShellCommand::Export(format) => {
                page.export(format).await;
            }
            ShellCommand::FollowUp(index) => {
                if page.use_follow_up(index) {
                    ask(&mut page).await;
                } else {
                    println!("{}", "No such follow-up suggestion".yellow());
                }
            }
            ShellCommand::Sample(index) => {
                if page.use_sample(index) {
                    ask(&mut page).await;
                } else {
                    println!("{}", "No such sample question".yellow());
                }
            }
            ShellCommand::Init => {
                let before = page.blocks().len();
                page.initialise().await;
                print_blocks(&page.blocks()[before.min(page.blocks().len())..]);
            }
            ShellCommand::Dark => {
                let dark = page.toggle_dark_mode(store)?;
                println!("Dark mode {}", if dark { "on" } else { "off" });
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => break,
            ShellCommand::Invalid(message) => println!("{}", message.yellow()),
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            parse_line("  What were Q3 sales?  "),
            Some(ShellCommand::Ask("What were Q3 sales?".to_string()))
        );
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn test_numbers_are_one_based() {
        assert_eq!(parse_line("/follow 1"), Some(ShellCommand::FollowUp(0)));
        assert_eq!(parse_line("/sample 3"), Some(ShellCommand::Sample(2)));
        assert!(matches!(parse_line("/sample 0"), Some(ShellCommand::Invalid(_))));
        assert!(matches!(parse_line("/follow x"), Some(ShellCommand::Invalid(_))));
    }

    #[test]
    fn test_new_title_is_optional() {
        assert_eq!(parse_line("/new"), Some(ShellCommand::New(None)));
        assert_eq!(
            parse_line("/new Budget 2025"),
            Some(ShellCommand::New(Some("Budget 2025".to_string())))
        );
    }

    #[test]
    fn test_export_format_and_unknown_commands() {
        assert_eq!(
            parse_line("/export csv"),
            Some(ShellCommand::Export(ConversationFormat::Csv))
        );
        assert!(matches!(parse_line("/export pdf"), Some(ShellCommand::Invalid(_))));
        assert!(matches!(parse_line("/frobnicate"), Some(ShellCommand::Invalid(_))));
        assert_eq!(parse_line("/load"), Some(ShellCommand::Invalid("usage: /load ID".to_string())));
    }
}
