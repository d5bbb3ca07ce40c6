use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use flashcard_srs::config::Config;
use flashcard_srs::logging::init_tracing;
use flashcard_srs::services::import::{import_deck, DeckImport};
use flashcard_srs::services::study::{StudyError, StudyService};
use flashcard_srs::srs::{LessonSession, LessonStep, ResolvedCard, ReviewPass, TimingVariant};
use flashcard_srs::store::operations::decks::DeckSettings;
use flashcard_srs::store::{Store, StoreError};
use thiserror::Error;

const QUIT: &str = ":q";

#[derive(Parser)]
#[command(name = "flashcard-srs", about = "Spaced-repetition flashcard study", version)]
struct Cli {
    /// Path to the sled database (overrides SLED_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a deck from a JSON file
    Import { file: PathBuf },

    /// List decks with lesson and review counts
    Decks,

    /// Learn new cards, batch by batch
    Lessons {
        /// Deck id or pathname
        deck: String,
    },

    /// Review the cards that are due
    Reviews {
        /// Deck id or pathname
        deck: String,
    },

    /// Change a deck's lesson pacing or timing table
    Settings {
        /// Deck id or pathname
        deck: String,
        #[arg(long)]
        lessons_per_day: Option<u32>,
        #[arg(long)]
        batch_size: Option<u32>,
        /// "default" or "demo"
        #[arg(long)]
        timings: Option<TimingVariant>,
    },

    /// List a deck's cards with their level and next review
    Cards {
        /// Deck id or pathname
        deck: String,
    },

    /// Delete one card from a deck
    DeleteCard {
        /// Deck id or pathname
        deck: String,
        /// Card id, as shown by `cards`
        card: String,
    },

    /// Delete a deck and all of its cards
    Delete {
        /// Deck id or pathname
        deck: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Study(#[from] StudyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<flashcard_srs::srs::SessionError> for CliError {
    fn from(err: flashcard_srs::srs::SessionError) -> Self {
        CliError::Study(StudyError::Session(err))
    }
}

struct Terminal {
    input: io::StdinLock<'static>,
    output: io::Stdout,
}

impl Terminal {
    fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }

    /// `None` on end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(db) = cli.db.clone() {
        config.sled_path = db;
    }
    init_tracing(&config.log_config());

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> Result<(), CliError> {
    let store = Arc::new(Store::open(&config.sled_path)?);
    store.run_migrations()?;
    let service = StudyService::new(store.clone());
    let mut term = Terminal::new();

    let result = match cli.command {
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let import = DeckImport::from_json(&raw)?;
            let deck = import_deck(&store, &import, &config.deck_defaults)?;
            term.say(&format!(
                "Imported '{}' ({} cards) as {}",
                deck.name,
                import.cards.len(),
                deck.pathname
            ))?;
            Ok(())
        }
        Command::Decks => list_decks(&service, &mut term),
        Command::Lessons { deck } => study_lessons(&service, &deck, &mut term),
        Command::Reviews { deck } => study_reviews(&service, &deck, &mut term),
        Command::Settings {
            deck,
            lessons_per_day,
            batch_size,
            timings,
        } => {
            let current = service.deck(&deck)?;
            let updated = store.update_deck_settings(
                &current.id,
                DeckSettings {
                    lessons_per_day: lessons_per_day.unwrap_or(current.lessons_per_day),
                    lessons_batch_size: batch_size.unwrap_or(current.lessons_batch_size),
                    srs_timings_type: timings.unwrap_or(current.srs_timings_type),
                },
            )?;
            term.say(&format!(
                "{}: {} lessons/day, batches of {}, {} timings",
                updated.name,
                updated.lessons_per_day,
                updated.lessons_batch_size,
                updated.srs_timings_type
            ))?;
            Ok(())
        }
        Command::Cards { deck } => list_cards(&service, &deck, &mut term),
        Command::DeleteCard { deck, card } => {
            if service.delete_card(&deck, &card)? {
                term.say(&format!("Deleted card {card}"))?;
            } else {
                term.say(&format!("No card {card} in {deck}"))?;
            }
            Ok(())
        }
        Command::Delete { deck } => {
            let target = service.deck(&deck)?;
            if store.delete_deck(&target.id)? {
                term.say(&format!("Deleted '{}'", target.name))?;
            }
            Ok(())
        }
    };

    store.flush()?;
    result
}

fn list_decks(service: &StudyService, term: &mut Terminal) -> Result<(), CliError> {
    let now = Utc::now();
    let decks = service.store().list_decks()?;
    if decks.is_empty() {
        term.say("No decks yet. Import one with `flashcard-srs import <file>`.")?;
    }
    for deck in decks {
        let summary = service.deck_summary(&deck.id, now)?;
        term.say(&format!(
            "{:<24} {:>4} cards  {:>3} lessons ({} left today)  {:>3} reviews  {:>3} retired  [{}]",
            summary.pathname,
            summary.total_cards,
            summary.lessons_available,
            summary.lessons_remaining_today,
            summary.due_reviews,
            summary.retired,
            summary.srs_timings_type
        ))?;
    }
    Ok(())
}

fn list_cards(service: &StudyService, deck: &str, term: &mut Terminal) -> Result<(), CliError> {
    let deck = service.deck(deck)?;
    for card in service.store().list_deck_cards(&deck.id)? {
        let status = match (card.retired, card.next_review_date) {
            (true, _) => "retired".to_string(),
            (false, Some(due)) => format!("due {}", due.format("%Y-%m-%d %H:%M")),
            (false, None) => "lesson".to_string(),
        };
        term.say(&format!(
            "{}  L{:<2} {:<20} {} = {}",
            card.id, card.level, status, card.front, card.back
        ))?;
    }
    Ok(())
}

fn study_lessons(service: &StudyService, deck: &str, term: &mut Terminal) -> Result<(), CliError> {
    let mut flow = service.start_lessons(deck, Utc::now())?;

    loop {
        term.say(&format!(
            "-- Lesson batch {}/{} --",
            flow.batch_index() + 1,
            flow.batch_count()
        ))?;
        if !walk_lesson(flow.learn()?, term)? {
            return Ok(());
        }

        term.say("-- Quiz: type the back of each card --")?;
        let finished = quiz(flow.start_quiz()?, term, |_| Ok(()))?;
        if !finished {
            term.say("Quiz abandoned; nothing was saved for this batch.")?;
            return Ok(());
        }

        let promotions = flow.complete_quiz()?;
        service.record_batch(&promotions, Utc::now())?;
        term.say(&format!("Learned {} card(s).", promotions.len()))?;

        if !flow.has_next_batch() {
            term.say("All lessons for today are done.")?;
            return Ok(());
        }
        match term.ask("Continue with the next batch? [Y/n] ")? {
            Some(reply) if !reply.trim().eq_ignore_ascii_case("n") => {
                flow.next_batch()?;
            }
            _ => return Ok(()),
        }
    }
}

/// Returns false when the learner quits.
fn walk_lesson(session: &mut LessonSession, term: &mut Terminal) -> Result<bool, CliError> {
    loop {
        let card = session.current();
        term.say(&format!(
            "[{}/{}] {}",
            session.index() + 1,
            session.len(),
            card.front
        ))?;
        if session.is_flipped() {
            term.say(&format!("      = {}", card.back))?;
            if let Some(notes) = &card.notes {
                term.say(&format!("      ({notes})"))?;
            }
        }

        let prompt = if session.is_last() {
            "[enter] finish  [f] flip  [p] previous  [q] quit > "
        } else {
            "[enter] next  [f] flip  [p] previous  [q] quit > "
        };
        let Some(reply) = term.ask(prompt)? else {
            return Ok(false);
        };
        match reply.trim() {
            "f" => session.flip(),
            "p" => {
                session.previous();
            }
            "q" => return Ok(false),
            _ => {
                if session.next() == LessonStep::Completed {
                    return Ok(true);
                }
            }
        }
    }
}

/// Runs a pass to the end. Returns false when the learner quits early.
fn quiz<F>(pass: &mut ReviewPass, term: &mut Terminal, mut on_resolved: F) -> Result<bool, CliError>
where
    F: FnMut(&ResolvedCard) -> Result<(), CliError>,
{
    loop {
        let prompt = format!(
            "[{:>3.0}%] {} > ",
            pass.progress() * 100.0,
            pass.current_card().front
        );
        let Some(answer) = term.ask(&prompt)? else {
            return Ok(false);
        };
        if answer.trim() == QUIT {
            return Ok(false);
        }
        if answer.trim().is_empty() {
            continue;
        }

        let feedback = pass.submit(&answer)?;
        if feedback.was_correct {
            term.say("  correct")?;
        } else {
            term.say(&format!("  incorrect, answer: {}", feedback.expected))?;
        }
        if let Some(resolved) = &feedback.resolved {
            on_resolved(resolved)?;
            let status = if resolved.outcome.is_retired {
                "retired".to_string()
            } else {
                format!("level {}", resolved.outcome.next_level)
            };
            term.say(&format!("  {} -> {status}", resolved.card.front))?;
        }

        if feedback.phase.is_finished() {
            return Ok(true);
        }
        pass.next()?;
    }
}

fn study_reviews(service: &StudyService, deck: &str, term: &mut Terminal) -> Result<(), CliError> {
    let mut pass = service.start_reviews(deck, Utc::now())?;
    term.say(&format!("-- {} review(s) --", pass.total()))?;

    let finished = quiz(&mut pass, term, |resolved| {
        service.record_resolved(resolved, Utc::now())?;
        Ok(())
    })?;
    if finished {
        term.say("Reviews done.")?;
    } else {
        term.say(&format!(
            "Stopped with {} card(s) left; they stay due.",
            pass.remaining()
        ))?;
    }
    Ok(())
}
