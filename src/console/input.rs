//! Line-based input and output for the console menus.

use std::fmt::Display;
use std::io::{BufRead, Write};

use anyhow::Result;
use thiserror::Error;

use crate::console::colors::Palette;
use crate::error::PmError;

/// Raised when the input stream is exhausted; ends the session cleanly.
#[derive(Debug, Error)]
#[error("end of input")]
pub struct EndOfInput;

/// Parse a menu selection; surrounding whitespace is ignored.
pub fn parse_choice(line: &str) -> Option<usize> {
    line.trim().parse().ok()
}

/// Reads answers from `reader` and writes prompts and messages to `writer`.
pub struct Prompt<R, W> {
    reader: R,
    writer: W,
    palette: Palette,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(reader: R, writer: W, palette: Palette) -> Self {
        Prompt { reader, writer, palette }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    pub fn lines<I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Display,
    {
        for line in lines {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    pub fn ok(&mut self, msg: &str) -> Result<()> {
        let line = self.palette.ok(msg);
        self.say(line)
    }

    pub fn error(&mut self, msg: &str) -> Result<()> {
        let line = self.palette.error(msg);
        self.say(line)
    }

    pub fn heading(&mut self, title: &str) -> Result<()> {
        let line = self.palette.heading(title);
        writeln!(self.writer)?;
        self.say(line)
    }

    /// Print `label`, then read one trimmed line.
    pub fn ask(&mut self, label: &str) -> Result<String> {
        Ok(self.read_answer(label)?.trim().to_string())
    }

    /// Like `ask`, but only the line ending is removed. Used for passwords.
    pub fn ask_secret(&mut self, label: &str) -> Result<String> {
        let mut answer = self.read_answer(label)?;
        let kept = answer.trim_end_matches(['\n', '\r']).len();
        answer.truncate(kept);
        Ok(answer)
    }

    fn read_answer(&mut self, label: &str) -> Result<String> {
        write!(self.writer, "{label}: ")?;
        self.writer.flush()?;
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Err(EndOfInput.into());
        }
        Ok(buf)
    }

    /// Ask for a number. Non-numeric answers print a hint and yield `None`.
    pub fn ask_number(&mut self, label: &str) -> Result<Option<usize>> {
        let answer = self.ask(label)?;
        match parse_choice(&answer) {
            Some(n) => Ok(Some(n)),
            None => {
                self.error("please enter a valid number")?;
                Ok(None)
            }
        }
    }

    /// List `options` numbered from 1 and return the zero-based index picked.
    ///
    /// A number outside the list is an `InvalidInput` error.
    pub fn pick(&mut self, label: &str, options: &[String]) -> Result<Option<usize>> {
        for (i, option) in options.iter().enumerate() {
            writeln!(self.writer, "{}. {option}", i + 1)?;
        }
        let Some(n) = self.ask_number(label)? else {
            return Ok(None);
        };
        if n == 0 || n > options.len() {
            return Err(PmError::invalid_input(format!("{n} is not between 1 and {}", options.len())).into());
        }
        Ok(Some(n - 1))
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(input: &str) -> Prompt<&[u8], Vec<u8>> {
        Prompt::new(input.as_bytes(), Vec::new(), Palette::plain())
    }

    fn output(p: Prompt<&[u8], Vec<u8>>) -> String {
        String::from_utf8(p.into_parts().1).unwrap()
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice(" 3 \n"), Some(3));
        assert_eq!(parse_choice("three"), None);
        assert_eq!(parse_choice("-1"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn test_ask_trims_and_detects_eof() {
        let mut p = prompt("  joao  \n");
        assert_eq!(p.ask("Login").unwrap(), "joao");
        assert!(p.ask("Password").unwrap_err().is::<EndOfInput>());
    }

    #[test]
    fn test_ask_secret_keeps_spaces() {
        let mut p = prompt(" pass word \r\n\n");
        assert_eq!(p.ask_secret("Password").unwrap(), " pass word ");
        assert_eq!(p.ask_secret("Password").unwrap(), "");
        assert!(p.ask_secret("Password").unwrap_err().is::<EndOfInput>());
    }

    #[test]
    fn test_ask_number_rejects_text() {
        let mut p = prompt("abc\n2\n");
        assert_eq!(p.ask_number("Option").unwrap(), None);
        assert_eq!(p.ask_number("Option").unwrap(), Some(2));
        assert!(output(p).contains("[ERROR] please enter a valid number"));
    }

    #[test]
    fn test_pick() {
        let options = vec!["Sales".to_string(), "Support".to_string()];
        let mut p = prompt("2\n3\n0\n");
        assert_eq!(p.pick("Team", &options).unwrap(), Some(1));
        let err = p.pick("Team", &options).unwrap_err();
        assert!(matches!(err.downcast_ref::<PmError>(), Some(PmError::InvalidInput(_))));
        assert!(p.pick("Team", &options).is_err());
        assert!(output(p).starts_with("1. Sales\n2. Support\nTeam: "));
    }
}
