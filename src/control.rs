//! Line-oriented control protocol for driving the slideshow from a terminal.

use std::path::PathBuf;

use crate::config::{SortDirection, SortMode};
use crate::events::{CopyTarget, SlideshowCommand};
use crate::navigation::Direction;

pub const HELP: &str = "\
commands:
  next | n              show the next image (or next match)
  prev | p              show the previous image (or previous match)
  random | r            jump to a random image
  pause | resume | toggle
  start | stop
  delete [yes]          move the current image to the trash
  fav | like            copy the current image to favorites / likes
  favorites <dir>       set the favorites folder
  likes <dir>           set the likes folder
  search <terms...>     set the metadata query (empty clears it)
  skip on|off           skip to images matching the query
  confirm on|off        ask before deleting
  info on|off           show the metadata panel
  sort random|time|alpha [asc|desc]
  interval <seconds>    0.5 to 60
  open <path>           open a folder or a single image
  unreadable            report the current image as broken
  quit | q";

/// One parsed control line.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    Command(SlideshowCommand),
    Help,
    Quit,
}

/// Parse a control line. Blank lines yield `Ok(None)`.
///
/// # Errors
/// Returns a message describing the malformed input.
pub fn parse_line(line: &str) -> Result<Option<ControlInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    use SlideshowCommand as C;
    let cmd = match word.to_ascii_lowercase().as_str() {
        "quit" | "q" | "exit" => return Ok(Some(ControlInput::Quit)),
        "help" | "?" => return Ok(Some(ControlInput::Help)),
        "next" | "n" => C::Advance(Direction::Forward),
        "prev" | "p" | "previous" => C::Advance(Direction::Backward),
        "random" | "r" => C::RandomJump,
        "pause" => C::SetPaused(true),
        "resume" => C::SetPaused(false),
        "toggle" => C::TogglePause,
        "start" => C::Start,
        "stop" => C::Stop,
        "delete" | "del" => C::Delete {
            confirmed: matches!(rest, "yes" | "y" | "!"),
        },
        "fav" => C::Copy(CopyTarget::Favorites),
        "like" => C::Copy(CopyTarget::Likes),
        "favorites" => C::SetCopyFolder(CopyTarget::Favorites, required_path(rest)?),
        "likes" => C::SetCopyFolder(CopyTarget::Likes, required_path(rest)?),
        "search" => C::SetQuery(rest.to_string()),
        "skip" => C::SetSkipToMatch(on_off(rest)?),
        "confirm" => C::SetConfirmDelete(on_off(rest)?),
        "info" => C::SetInfoPanelVisible(on_off(rest)?),
        "sort" => parse_sort(rest)?,
        "interval" => C::SetInterval(parse_seconds(rest)?),
        "open" => {
            let path = required_path(rest)?;
            if path.is_dir() {
                C::OpenFolder(path)
            } else {
                C::OpenFile(path)
            }
        }
        "unreadable" => C::ItemUnreadable,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(ControlInput::Command(cmd)))
}

fn required_path(rest: &str) -> Result<PathBuf, String> {
    if rest.is_empty() {
        return Err("missing path".to_string());
    }
    Ok(PathBuf::from(rest))
}

fn on_off(rest: &str) -> Result<bool, String> {
    match rest.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Ok(true),
        "off" | "no" | "false" | "0" => Ok(false),
        other => Err(format!("expected on|off, got '{other}'")),
    }
}

fn parse_sort(rest: &str) -> Result<SlideshowCommand, String> {
    let mut parts = rest.split_whitespace();
    let mode: SortMode = parts.next().ok_or("missing sort mode")?.parse()?;
    let direction = match parts.next() {
        Some(d) => d.parse::<SortDirection>()?,
        None => SortDirection::Ascending,
    };
    Ok(SlideshowCommand::SetSort { mode, direction })
}

fn parse_seconds(rest: &str) -> Result<u64, String> {
    let secs: f64 = rest
        .parse()
        .map_err(|_| format!("invalid number of seconds '{rest}'"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid number of seconds '{rest}'"));
    }
    Ok((secs * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> SlideshowCommand {
        match parse_line(line) {
            Ok(Some(ControlInput::Command(c))) => c,
            other => panic!("expected command for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn navigation_words() {
        assert_eq!(cmd("n"), SlideshowCommand::Advance(Direction::Forward));
        assert_eq!(cmd("  PREV "), SlideshowCommand::Advance(Direction::Backward));
        assert_eq!(cmd("random"), SlideshowCommand::RandomJump);
    }

    #[test]
    fn search_keeps_raw_text() {
        assert_eq!(
            cmd("search cat  hat"),
            SlideshowCommand::SetQuery("cat  hat".to_string())
        );
        assert_eq!(cmd("search"), SlideshowCommand::SetQuery(String::new()));
    }

    #[test]
    fn sort_with_and_without_direction() {
        assert_eq!(
            cmd("sort alpha desc"),
            SlideshowCommand::SetSort {
                mode: SortMode::Alphabetical,
                direction: SortDirection::Descending
            }
        );
        assert_eq!(
            cmd("sort time"),
            SlideshowCommand::SetSort {
                mode: SortMode::Time,
                direction: SortDirection::Ascending
            }
        );
        assert!(parse_line("sort size").is_err());
    }

    #[test]
    fn interval_in_seconds() {
        assert_eq!(cmd("interval 2.5"), SlideshowCommand::SetInterval(2500));
        assert!(parse_line("interval soon").is_err());
        assert!(parse_line("interval -1").is_err());
    }

    #[test]
    fn delete_confirmation_suffix() {
        assert_eq!(cmd("delete"), SlideshowCommand::Delete { confirmed: false });
        assert_eq!(cmd("delete yes"), SlideshowCommand::Delete { confirmed: true });
    }

    #[test]
    fn blank_quit_and_unknown() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("q"), Ok(Some(ControlInput::Quit)));
        assert!(parse_line("dance").is_err());
        assert!(parse_line("skip maybe").is_err());
    }
}
