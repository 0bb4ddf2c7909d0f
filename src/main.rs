use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};

use focus_dojo::clock::{SharedClock, SystemClock};
use focus_dojo::config::Config;
use focus_dojo::content::{self, Content};
use focus_dojo::event::{DojoEvent, EventHandler};
use focus_dojo::notice::{LogNotifier, Notice, NoticeLevel, Notifier};
use focus_dojo::store::schema::ExportData;
use focus_dojo::store::{Exercise, JsonStore, ScoreBoard};
use focus_dojo::{Dojo, DojoScreen};

#[derive(Parser)]
#[command(
    name = "focus-dojo",
    version,
    about = "Attention recovery drills: paced reading, strict typing, and a daily recovery score"
)]
struct Cli {
    #[arg(long, help = "Directory for score data")]
    data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Phrase language (en, id)")]
    language: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read a text sentence by sentence (defaults to the bundled passage)
    Read {
        #[arg(conflicts_with = "preset")]
        file: Option<PathBuf>,
        /// Library article id (mental-fatigue, dopamine-loop, attention-residue, deep-work, cognitive-load)
        #[arg(short, long)]
        preset: Option<String>,
    },
    /// Type a quote without a single mistake
    Type,
    /// Print the rolling averages and today's recovery score
    Score,
    /// Write all score data to a JSON file
    Export { file: PathBuf },
    /// Replace all score data from an exported JSON file
    Import { file: PathBuf },
    /// Write the effective configuration to the config file
    Config,
}

/// Keeps the most recent notice for the status line and logs all of them.
struct StatusLine(Rc<RefCell<Option<Notice>>>);

impl Notifier for StatusLine {
    fn notify(&mut self, notice: Notice) {
        LogNotifier.notify(notice.clone());
        *self.0.borrow_mut() = Some(notice);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("config unreadable ({e:#}); using defaults");
        Config::default()
    });
    if let Some(language) = cli.language {
        config.language = language;
        config.validate(&content::available_languages());
    }

    if let Some(Command::Config) = cli.command {
        let path = config.save()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let store = match cli.data_dir.or_else(|| config.data_dir.clone()) {
        Some(dir) => JsonStore::with_base_dir(dir)?,
        None => JsonStore::new()?,
    };
    let clock = SystemClock::shared();
    let mut scoreboard = ScoreBoard::load(Box::new(store), clock.clone(), config.scoring.clone());

    match cli.command {
        Some(Command::Score) => {
            scoreboard.check_daily_reset()?;
            print_scores(&scoreboard);
            Ok(())
        }
        Some(Command::Export { file }) => {
            let data = scoreboard.export();
            let json = serde_json::to_string_pretty(&data)?;
            fs::write(&file, json).with_context(|| format!("writing {}", file.display()))?;
            println!("Exported scores to {}", file.display());
            Ok(())
        }
        Some(Command::Import { file }) => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let data: ExportData = serde_json::from_str(&raw).context("not a score export")?;
            scoreboard.import(data)?;
            println!("Imported scores from {}", file.display());
            Ok(())
        }
        Some(Command::Type) => {
            let (mut dojo, status) = open_dojo(config, scoreboard, clock);
            dojo.screen = DojoScreen::Typing;
            run_interactive(&mut dojo, &status)
        }
        Some(Command::Read { file, preset }) => {
            let (text, source_id) = read_source(file, preset)?;
            let (mut dojo, status) = open_dojo(config, scoreboard, clock);
            dojo.start_reading(&text, &source_id)?;
            run_interactive(&mut dojo, &status)
        }
        Some(Command::Config) => Ok(()),
        None => {
            let (mut dojo, status) = open_dojo(config, scoreboard, clock);
            dojo.start_reading(&content::default_text(), "default")?;
            run_interactive(&mut dojo, &status)
        }
    }
}

fn open_dojo(
    config: Config,
    scoreboard: ScoreBoard,
    clock: SharedClock,
) -> (Dojo, Rc<RefCell<Option<Notice>>>) {
    let status = Rc::new(RefCell::new(None));
    let content = Content::load(&config.language);
    let dojo = Dojo::new(config, content, scoreboard, clock, SmallRng::from_entropy())
        .with_notifier(Box::new(StatusLine(status.clone())));
    (dojo, status)
}

fn read_source(file: Option<PathBuf>, preset: Option<String>) -> Result<(String, String)> {
    if let Some(id) = preset {
        let Some(text) = content::library_text(&id) else {
            bail!(
                "unknown article '{id}' (available: {})",
                content::library_ids().join(", ")
            );
        };
        return Ok((text, id));
    }

    let Some(path) = file else {
        return Ok((content::default_text(), "default".to_string()));
    };
    let text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let source_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "custom".to_string());
    Ok((text, source_id))
}

fn print_scores(scoreboard: &ScoreBoard) {
    for exercise in Exercise::ALL {
        println!(
            "{:<12} {:>3}  ({} attempts today)",
            exercise.to_string(),
            scoreboard.rolling_average(exercise),
            scoreboard.attempts_today(exercise)
        );
    }
    println!("{:<12} {:>3}", "recovery", scoreboard.recovery_score());
}

fn run_interactive(dojo: &mut Dojo, status: &Rc<RefCell<Option<Notice>>>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(50));
    let result = run_app(&mut terminal, dojo, status, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(reading) = &dojo.last_reading {
        println!(
            "{}: score {}, {} wpm, {} skims, {} drifts",
            reading.source_id,
            reading.score,
            reading.average_wpm,
            reading.skimming_count,
            reading.distraction_count
        );
    }
    println!("Recovery score: {}", dojo.recovery_score());
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dojo: &mut Dojo,
    status: &Rc<RefCell<Option<Notice>>>,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, dojo, status.borrow().as_ref()))?;

        match events.next()? {
            DojoEvent::Key(key) => handle_key(dojo, key),
            DojoEvent::Tick => dojo.tick(),
            DojoEvent::Resize => {}
        }

        if dojo.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(dojo: &mut Dojo, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        dojo.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => {
            dojo.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            dojo.screen = dojo.screen.next();
            return;
        }
        _ => {}
    }

    match dojo.screen {
        DojoScreen::Reader => handle_reader_key(dojo, key),
        DojoScreen::Typing => handle_typing_key(dojo, key),
        DojoScreen::Scores => {}
    }
}

fn handle_reader_key(dojo: &mut Dojo, key: KeyEvent) {
    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            dojo.advance_reading();
        }
        KeyCode::Left | KeyCode::Char('h') => {
            dojo.retreat_reading();
        }
        _ => {}
    }
}

fn handle_typing_key(dojo: &mut Dojo, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('n') => {
                dojo.reroll_typing();
            }
            KeyCode::Char('r') => dojo.retry_typing(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Backspace => {
            dojo.type_backspace();
        }
        KeyCode::Char(ch) => {
            dojo.type_char(ch);
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, dojo: &Dojo, notice: Option<&Notice>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let title = match dojo.screen {
        DojoScreen::Reader => "Reader",
        DojoScreen::Typing => "Zen Type",
        DojoScreen::Scores => "Scores",
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " focus-dojo ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {title} | recovery {}", dojo.recovery_score())),
    ]));
    frame.render_widget(header, layout[0]);

    let footer = match dojo.screen {
        DojoScreen::Reader => " [Space] Next  [Left] Previous  [Tab] Screen  [Esc] Quit ",
        DojoScreen::Typing => {
            " [Ctrl-N] New quote  [Ctrl-R] Retry  [Tab] Screen  [Esc] Quit  (no backspace) "
        }
        DojoScreen::Scores => " [Tab] Screen  [Esc] Quit ",
    };

    match dojo.screen {
        DojoScreen::Reader => render_reader(frame, dojo, layout[1], layout[2]),
        DojoScreen::Typing => render_typing(frame, dojo, layout[1], layout[2]),
        DojoScreen::Scores => render_scores(frame, dojo, layout[1]),
    }

    if let Some(notice) = notice {
        let color = match notice.level() {
            NoticeLevel::Info => Color::Gray,
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        let status = Paragraph::new(Span::styled(
            format!(" {}", notice.message()),
            Style::default().fg(color),
        ));
        frame.render_widget(status, layout[3]);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(footer, Style::default().fg(Color::DarkGray))),
        layout[4],
    );
}

fn progress_gauge(label: &str, percent: f64) -> Gauge<'_> {
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(label))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
}

fn render_reader(frame: &mut ratatui::Frame, dojo: &Dojo, body: Rect, bar: Rect) {
    let Some(reader) = &dojo.reader else {
        frame.render_widget(Paragraph::new(" No text loaded."), body);
        return;
    };

    let block = Block::default().borders(Borders::ALL).title(format!(
        " {} | score {} | {} wpm ",
        reader.source_id(),
        reader.score(),
        reader.current_wpm()
    ));

    let lines = match reader.result() {
        Some(result) => vec![
            Line::from(Span::styled(
                format!("Session complete. Final score {}.", result.score),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "{} words over {} sentences, {} wpm average",
                result.total_words_read, result.sentences, result.average_wpm
            )),
            Line::from(format!(
                "{} skims, {} drifts",
                result.skimming_count, result.distraction_count
            )),
        ],
        None => vec![Line::from(
            reader.active_sentence().unwrap_or_default().trim().to_string(),
        )],
    };
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, body);

    let label = format!(
        " Sentence {}/{} ",
        (reader.active_index() + 1).min(reader.sentences().len()),
        reader.sentences().len()
    );
    frame.render_widget(progress_gauge(&label, reader.progress()), bar);
}

fn render_typing(frame: &mut ratatui::Frame, dojo: &Dojo, body: Rect, bar: Rect) {
    let typing = &dojo.typing;
    if typing.target().is_empty() {
        frame.render_widget(Paragraph::new(" No quotes available."), body);
        return;
    }

    let input_color = if typing.is_error() {
        Color::Red
    } else if typing.is_complete() {
        Color::Green
    } else {
        Color::Cyan
    };
    let status = match typing.final_score() {
        Some(score) => format!("Complete. Efficiency {score}%"),
        None => format!("{} keystrokes", typing.total_keystrokes()),
    };

    let lines = vec![
        Line::from(typing.target().to_string()),
        Line::from(""),
        Line::from(Span::styled(
            typing.input().to_string(),
            Style::default().fg(input_color),
        )),
        Line::from(""),
        Line::from(Span::styled(status, Style::default().fg(Color::DarkGray))),
    ];
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Type the quote "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, body);

    frame.render_widget(progress_gauge(" Progress ", typing.progress()), bar);
}

fn render_scores(frame: &mut ratatui::Frame, dojo: &Dojo, body: Rect) {
    let mut lines: Vec<Line> = Exercise::ALL
        .iter()
        .map(|&exercise| {
            Line::from(format!(
                "{:<12} {:>3}  ({} today)",
                exercise.to_string(),
                dojo.scoreboard.rolling_average(exercise),
                dojo.scoreboard.attempts_today(exercise)
            ))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{:<12} {:>3}", "recovery", dojo.recovery_score()),
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Scores "));
    frame.render_widget(paragraph, body);
}
