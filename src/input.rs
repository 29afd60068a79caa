use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use secrecy::SecretString;

/// Minimal line-editor state backing the password prompt.
#[derive(Debug, Default)]
struct InputState {
    value: String,
}

impl InputState {
    fn insert(&mut self, c: char) {
        self.value.push(c);
    }

    fn backspace(&mut self) -> bool {
        self.value.pop().is_some()
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

/// Read a password from the terminal, echoing a mask character per key.
/// Returns `None` when the user aborts with Esc or Ctrl-C.
pub fn read_password(label: &str) -> io::Result<Option<SecretString>> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}")?;
    stderr.flush()?;

    enable_raw_mode()?;
    let result = read_masked(&mut stderr);
    disable_raw_mode()?;
    writeln!(stderr)?;

    result
}

fn read_masked(out: &mut impl Write) -> io::Result<Option<SecretString>> {
    let mut input = InputState::default();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Some(SecretString::from(input.take()))),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Char(c) => {
                input.insert(c);
                write!(out, "*")?;
                out.flush()?;
            }
            KeyCode::Backspace => {
                if input.backspace() {
                    write!(out, "\u{8} \u{8}")?;
                    out.flush()?;
                }
            }
            _ => {}
        }
    }
}
