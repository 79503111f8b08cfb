// Terminal front end: the same turn logic as the web UI, one line per turn.
// Choice lists are printed numbered; answering with a number (or an exact
// name) sends a selection.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::info;

use crate::constants::WELCOME_MESSAGE;
use crate::model::ModelCaller;
use crate::orchestrator::handle_turn;
use crate::reply::{Reply, TurnInput};

pub struct ChatSession<'a> {
    model: &'a dyn ModelCaller,
    local_override: bool,
    has_api_key: bool,
    offered: Vec<String>,
}

impl<'a> ChatSession<'a> {
    pub fn new(model: &'a dyn ModelCaller, local_override: bool, has_api_key: bool) -> Self {
        Self {
            model,
            local_override,
            has_api_key,
            offered: Vec::new(),
        }
    }

    /// Turn a typed line into a turn, treating answers to the last choice list as selections.
    fn input_for(&self, line: &str) -> TurnInput {
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.offered.get(i))
            .or_else(|| self.offered.iter().find(|c| c.as_str() == line));

        let input = match picked {
            Some(choice) => TurnInput::select(line, choice.clone()),
            None => TurnInput::new(line),
        };
        input.local(self.local_override).with_api_key(self.has_api_key)
    }

    /// Resolve one line and render the outcome as display text.
    pub async fn respond(&mut self, line: &str) -> String {
        let input = self.input_for(line);
        match handle_turn(&input, self.model).await {
            Ok(reply) => {
                let rendered = render(&reply);
                self.offered = reply.choices().map(<[String]>::to_vec).unwrap_or_default();
                rendered
            }
            Err(e) => format!("Sorry, something went wrong: {}", e),
        }
    }

    pub async fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<()> {
        info!("Starting terminal chat...");
        writeln!(output, "QUPAL: {}", WELCOME_MESSAGE)?;

        let mut line = String::new();
        loop {
            write!(output, "> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
                break;
            }

            let answer = self.respond(text).await;
            writeln!(output, "QUPAL: {}", answer)?;
        }

        writeln!(output, "Goodbye, happy thrifting!")?;
        info!("Terminal chat finished.");
        Ok(())
    }
}

fn render(reply: &Reply) -> String {
    match reply {
        Reply::Plain(text) => text.clone(),
        Reply::Choices { text, choices } => {
            let mut out = text.clone();
            for (i, choice) in choices.iter().enumerate() {
                out.push_str(&format!("\n  {}. {}", i + 1, choice));
            }
            out
        }
    }
}
