use std::io::{self, BufRead, Write};

use chrono::Local;
use puzzle_core::tier::{puzzle_difficulty, user_tier};
use tracing_subscriber::EnvFilter;

use trainer::config::Config;
use trainer::corpus::CorpusStore;
use trainer::ledger::AttemptLedger;
use trainer::rating::RatingStore;
use trainer::rules::BoardRules;
use trainer::session::{HelpOutcome, MoveOutcome, PuzzleSession, SessionState};
use trainer::settings::Settings;
use trainer::stats;
use trainer::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    let storage = Storage::open(&config.storage_path).await?;

    let settings = Settings::load(&storage).await;
    if settings.daily_puzzles_disabled {
        tracing::info!("Daily puzzles are disabled in settings");
        return Ok(());
    }

    let corpus = CorpusStore::new(storage.clone(), &config.corpus_path, config.release_date);
    let rating_store = RatingStore::new(storage.clone());
    let ledger = AttemptLedger::new(storage.clone());

    let today = Local::now().date_naive();
    let puzzle = corpus.daily_puzzle(today).await?;
    let user_rating = rating_store.initialize().await;

    let tier = user_tier(user_rating.rating.round() as i32);
    println!("Your rating: {} ({})", user_rating.rating.round(), tier.name);
    if let Some(rating) = puzzle.rating {
        println!(
            "Today's puzzle: {} (rated {}, {})",
            puzzle.id,
            rating,
            puzzle_difficulty(rating).label()
        );
    } else {
        println!("Today's puzzle: {} (unrated)", puzzle.id);
    }

    let prior = ledger.find_by_puzzle_or_fen(&puzzle.id, &puzzle.fen).await;
    if let Some(attempt) = prior.as_ref().filter(|a| a.is_finished) {
        print_completion(attempt);
        print_stats(&ledger).await;
        return Ok(());
    }

    let rules = BoardRules::new(&puzzle.fen)?;
    let mut session = PuzzleSession::new(
        Box::new(rules),
        rating_store,
        ledger.clone(),
        storage.clone(),
        puzzle,
        user_rating,
        prior.as_ref(),
    )?;

    session.start().await?;
    println!(
        "Your turn. Find the best move for {}.",
        session.user_side().name()
    );
    println!("Position: {}", session.position_fen());
    println!("Enter moves as e2e4; commands: hint, reveal, resign, quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let input = line?.trim().to_lowercase();

        match input.as_str() {
            "quit" => break,
            "resign" => {
                session.abandon().await;
                println!("Puzzle abandoned.");
                break;
            }
            "hint" => match session.hint().await? {
                (HelpOutcome::Granted { .. }, Some(square)) => {
                    println!("Look at the piece on {square}.");
                }
                (HelpOutcome::NeedsAcknowledgement, _) => {
                    if confirm_help(&stdin)? {
                        session.acknowledge_help_warning().await;
                    }
                }
                _ => println!("No hint available right now."),
            },
            "reveal" => match session.reveal_next().await? {
                HelpOutcome::Granted {
                    solved_line_finished,
                } => {
                    println!("Played: {}", session.position_fen());
                    if solved_line_finished {
                        println!("That was the last move of the solution.");
                        break;
                    }
                }
                HelpOutcome::NeedsAcknowledgement => {
                    if confirm_help(&stdin)? {
                        session.acknowledge_help_warning().await;
                    }
                }
                HelpOutcome::Rejected => println!("Nothing to reveal right now."),
            },
            mv if mv.len() == 4 => {
                let (from, to) = mv.split_at(2);
                match session.submit_move(from, to).await? {
                    MoveOutcome::Rejected => println!("That move can't be played."),
                    MoveOutcome::Incorrect => {
                        println!("That's not the move! Try something else.")
                    }
                    MoveOutcome::Correct { solved: false } => {
                        println!("Best move! Keep going...");
                        println!("Position: {}", session.position_fen());
                    }
                    MoveOutcome::Correct { solved: true } => {
                        println!("Success! Puzzle completed.");
                        if let Some(delta) = session.rating_change() {
                            println!(
                                "Rating: {} ({:+})",
                                session.user_rating().rating.round(),
                                delta.round() as i64
                            );
                        }
                        break;
                    }
                }
            }
            "" => {}
            _ => println!("Unrecognized input."),
        }

        if session.state() == SessionState::Solved {
            break;
        }
    }

    print_stats(&ledger).await;
    Ok(())
}

fn confirm_help(stdin: &io::Stdin) -> anyhow::Result<bool> {
    print!("Using help forfeits solved-credit for today's puzzle. Continue? [y/N] ");
    io::stdout().flush()?;
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(false);
    };
    Ok(line?.trim().eq_ignore_ascii_case("y"))
}

fn print_completion(attempt: &trainer::ledger::PuzzleAttempt) {
    if attempt.is_solved {
        println!("Already solved today's puzzle. Come back tomorrow!");
    } else {
        println!("Today's puzzle is finished. A new one arrives tomorrow.");
    }
    if let Some(delta) = attempt.rating_change {
        println!("Rating change: {:+}", delta.round() as i64);
    }
}

async fn print_stats(ledger: &AttemptLedger) {
    let attempts = ledger.all().await;
    if attempts.is_empty() {
        return;
    }

    let today = Local::now().date_naive();
    let s = stats::compute(&attempts, today);
    println!(
        "Attempts: {} | Solved: {} ({}%) | Avg time: {:.0}s | Streak: {} (best {})",
        s.total, s.solved, s.solve_rate, s.avg_time_seconds, s.current_streak, s.best_streak
    );
}
