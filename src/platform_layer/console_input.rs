/*
 * Parsing of the console's line commands. Page numbers are typed 1-based and
 * converted to the zero-based positions used everywhere else.
 */
use super::types::ActionId;
use std::path::PathBuf;

pub(crate) const HELP_TEXT: &str = "\
Commands:
  open <path>          open a page layout
  save [<path>]        save the page layout (default: current file name)
  select [<n> ...]     select pages by number (no numbers clears the selection)
  remove               remove the selected pages
  remove-previous      remove all pages before the selected page
  remove-next          remove all pages after the selected page
  rotate-left          rotate the selected pages counter-clockwise
  rotate-right         rotate the selected pages clockwise
  undo | redo
  close-notification   hide the \"Saved!\" notification
  show                 print the window state and the pages
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleInput {
    Open(PathBuf),
    // An empty path accepts the proposed file name.
    Save(PathBuf),
    Select(Vec<usize>),
    Action(ActionId),
    CloseNotification,
    Show,
    Help,
    Quit,
}

/*
 * Parses one line. Blank lines yield `Ok(None)`; the error string is meant for the
 * user.
 */
pub(crate) fn parse_console_line(line: &str) -> Result<Option<ConsoleInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word {
        "open" => {
            if rest.is_empty() {
                return Err("usage: open <path>".to_string());
            }
            ConsoleInput::Open(PathBuf::from(rest))
        }
        "save" => ConsoleInput::Save(PathBuf::from(rest)),
        "select" => ConsoleInput::Select(parse_page_numbers(rest)?),
        "remove" => ConsoleInput::Action(ActionId::RemoveSelectedPages),
        "remove-previous" => ConsoleInput::Action(ActionId::RemovePreviousPages),
        "remove-next" => ConsoleInput::Action(ActionId::RemoveNextPages),
        "rotate-left" => ConsoleInput::Action(ActionId::RotatePagesLeft),
        "rotate-right" => ConsoleInput::Action(ActionId::RotatePagesRight),
        "undo" => ConsoleInput::Action(ActionId::Undo),
        "redo" => ConsoleInput::Action(ActionId::Redo),
        "close-notification" => ConsoleInput::CloseNotification,
        "show" => ConsoleInput::Show,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };

    let takes_arguments = matches!(word, "open" | "save" | "select");
    if !takes_arguments && !rest.is_empty() {
        return Err(format!("'{word}' takes no arguments"));
    }
    Ok(Some(input))
}

fn parse_page_numbers(text: &str) -> Result<Vec<usize>, String> {
    text.split_whitespace()
        .map(|token| match token.parse::<usize>() {
            Ok(number) if number >= 1 => Ok(number - 1),
            _ => Err(format!("'{token}' is not a page number")),
        })
        .collect()
}
