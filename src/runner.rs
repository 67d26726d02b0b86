use chrono::Local;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::{
    checkin::{CheckinError, CheckinService},
    models::CheckinState,
    scheduling::CheckinSignal,
};

const BREAKDOWN_DAYS: u32 = 7;

/// What a line typed at the headless prompt asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum PromptInput<'a> {
    Answer {
        state: Option<CheckinState>,
        response: &'a str,
    },
    Stats,
    TodayLog,
    Question,
    Blank,
}

/// `f:`/`w:`/`r:` pick the state explicitly; anything else is classified.
pub fn parse_prompt_input(line: &str) -> PromptInput<'_> {
    let line = line.trim();
    match line {
        "" => return PromptInput::Blank,
        ":stats" => return PromptInput::Stats,
        ":log" => return PromptInput::TodayLog,
        ":ask" => return PromptInput::Question,
        _ => {}
    }

    let explicit = [
        ("f:", CheckinState::Focused),
        ("w:", CheckinState::Wandering),
        ("r:", CheckinState::Resting),
    ];
    for (prefix, state) in explicit {
        if let Some(rest) = line.strip_prefix(prefix) {
            return PromptInput::Answer {
                state: Some(state),
                response: rest.trim(),
            };
        }
    }

    PromptInput::Answer {
        state: None,
        response: line,
    }
}

/// Drives a started service from stdin until Ctrl-C.
pub async fn run_prompt_loop(
    service: &CheckinService,
    mut signals: tokio::sync::mpsc::UnboundedReceiver<CheckinSignal>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdin_open = true;
    let mut pending_question: Option<String> = None;

    loop {
        tokio::select! {
            signal = signals.recv() => {
                let Some(signal) = signal else { break };
                println!("[{}] {}", signal.fired_at.format("%H:%M"), signal.question);
                pending_question = Some(signal.question);
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        handle_line(service, &line, &mut pending_question).await;
                    }
                    None => {
                        log::info!("stdin closed; check-ins will only be logged");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl-C received");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_line(
    service: &CheckinService,
    line: &str,
    pending_question: &mut Option<String>,
) {
    match parse_prompt_input(line) {
        PromptInput::Blank => {}
        PromptInput::Question => {
            let question = service.next_question();
            println!("{question}");
            *pending_question = Some(question);
        }
        PromptInput::Stats => {
            println!("{}", service.stats_snapshot().await.summary());
            match service.recent_breakdown(BREAKDOWN_DAYS).await {
                Ok(days) => {
                    for day in days {
                        println!(
                            "{}  focused {:>3}  wandering {:>3}  resting {:>3}",
                            day.date, day.focused, day.wandering, day.resting
                        );
                    }
                }
                Err(err) => log::error!("Failed to load breakdown: {err}"),
            }
        }
        PromptInput::TodayLog => match service.today_entries().await {
            Ok(entries) if entries.is_empty() => println!("No check-ins logged today."),
            Ok(entries) => {
                for entry in entries {
                    println!("{} [{}] {}", entry.time, entry.state.label(), entry.response);
                }
            }
            Err(err) => log::error!("Failed to read today's log: {err}"),
        },
        PromptInput::Answer { state, response } => {
            let question = pending_question.take();
            let result = match state {
                Some(state) => {
                    service
                        .submit_answer_with_question(question.as_deref(), response, state)
                        .await
                }
                None => {
                    service
                        .submit_classified_answer(question.as_deref(), response)
                        .await
                }
            };
            match result {
                Ok(entry) => println!("{}", entry.state.feedback_message()),
                Err(CheckinError::EmptyResponse) => {
                    println!("Type a short answer after the prefix.");
                }
                Err(err) => {
                    // Counters already include this answer.
                    log::error!("Check-in at {} was not saved: {err}", Local::now().format("%H:%M"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_pick_explicit_states() {
        assert_eq!(
            parse_prompt_input("w: reading news"),
            PromptInput::Answer {
                state: Some(CheckinState::Wandering),
                response: "reading news",
            }
        );
        assert_eq!(
            parse_prompt_input("  r:lunch "),
            PromptInput::Answer {
                state: Some(CheckinState::Resting),
                response: "lunch",
            }
        );
    }

    #[test]
    fn plain_text_is_left_for_classification() {
        assert_eq!(
            parse_prompt_input("refactoring the store"),
            PromptInput::Answer {
                state: None,
                response: "refactoring the store",
            }
        );
    }

    #[test]
    fn commands_and_blank_lines() {
        assert_eq!(parse_prompt_input(":stats"), PromptInput::Stats);
        assert_eq!(parse_prompt_input(":log"), PromptInput::TodayLog);
        assert_eq!(parse_prompt_input(":ask"), PromptInput::Question);
        assert_eq!(parse_prompt_input("   "), PromptInput::Blank);
    }
}
