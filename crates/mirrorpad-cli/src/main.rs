mod app;

use anyhow::Result;
use app::{App, draw};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mirrorpad_config::Config;
use mirrorpad_engine::{
    DocumentSyncEngine, FileEphemeralStore, FsDocumentStore, LocalAuth, PlainTextSurface,
    SelectionOffsetTracker, TextSurfaceController, User, UserId,
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    rc::Rc,
    time::Duration,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    // Determine store path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let (config, from_config) = if args.len() == 2 {
        // CLI argument overrides the configured store but keeps user and state settings
        let store_path = PathBuf::from(&args[1]);
        match Config::load() {
            Ok(Some(mut config)) => {
                config.store_path = store_path;
                (config, false)
            }
            _ => (Config::for_store(store_path), false),
        }
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => (config, true),
            Ok(None) => {
                eprintln!("Error: No store path provided and no config file found");
                eprintln!("Usage: {} <store-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <store-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [store-folder-path]", args[0]);
        process::exit(1);
    };

    init_logging(&config.state_path);
    log::info!(
        "mirrorpad starting up, store at {}",
        config.store_path.display()
    );

    let store = match FsDocumentStore::open(&config.store_path) {
        Ok(store) => store,
        Err(e) => {
            let source = if from_config {
                format!(" from config file '{}'", config_path.display())
            } else {
                String::new()
            };
            eprintln!(
                "Error: Store path '{}'{} is invalid: {e}",
                config.store_path.display(),
                source
            );
            process::exit(1);
        }
    };

    let user = User {
        id: UserId::new(config.user.id.clone()),
        email: config.user.email.clone(),
    };
    let tracker =
        SelectionOffsetTracker::new(Rc::new(FileEphemeralStore::new(&config.state_path)));
    let engine = DocumentSyncEngine::new(
        Rc::new(store),
        Rc::new(LocalAuth::signed_in(user)),
        TextSurfaceController::new(PlainTextSurface::new(), tracker),
    );
    let mut app = App::new(Rc::new(engine));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        println!("{err:?}");
    }

    Ok(())
}

/// Log to a file in the state directory; the terminal belongs to the editor.
/// `RUST_LOG` overrides the default level.
fn init_logging(state_path: &Path) {
    let log_file = fs::create_dir_all(state_path).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(state_path.join("mirrorpad.log"))
    });

    match log_file {
        Ok(file) => {
            env_logger::Builder::new()
                .filter_level(log::LevelFilter::Info)
                .parse_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        Err(e) => eprintln!(
            "Warning: logging disabled, cannot open log in {}: {e}",
            state_path.display()
        ),
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // The first restore centers against this height
    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));
    app.mount();

    loop {
        app.tick();
        terminal.draw(|f| draw(f, app))?;

        if app.should_quit() {
            log::info!("mirrorpad shutting down");
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            app.handle_event(event::read()?);
        }
    }
}
