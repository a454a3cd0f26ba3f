use lottery_core::{Key, Trigger};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Key(Key),
    Trigger(Trigger),
    Resize { width: f64, height: f64 },
    Exit,
}

/// One operator line. A blank line is the space bar.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim().to_ascii_lowercase();
    let mut words = line.split_whitespace();
    let command = match words.next() {
        None | Some("space" | "next" | "n") => Command::Key(Key::Advance),
        Some("esc" | "abort" | "a") => Command::Key(Key::Abort),
        Some("enter") => Command::Trigger(Trigger::Enter),
        Some("start") => Command::Trigger(Trigger::Start),
        Some("stop") => Command::Trigger(Trigger::Stop),
        Some("continue" | "confirm") => Command::Trigger(Trigger::Continue),
        Some("quit" | "void") => Command::Trigger(Trigger::Quit),
        Some("resize") => {
            let (width, height) = words.next()?.split_once('x')?;
            Command::Resize {
                width: width.parse().ok().filter(|w: &f64| *w > 0.0)?,
                height: height.parse().ok().filter(|h: &f64| *h > 0.0)?,
            }
        }
        Some("exit") => Command::Exit,
        Some(_) => return None,
    };
    Some(command)
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
