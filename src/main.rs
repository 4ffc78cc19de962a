use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use page_layout::{tracing_sub, xml};
use page_layout::{
    DirStore, InsertDirection, LayoutStore, LayoutTree, PageSession, SessionError,
    TemplateSession,
};

#[derive(Parser, Debug)]
#[command(
    name = "page-layout",
    version = env!("CARGO_PKG_VERSION"),
    about = "Edit the region and widget layout of page templates and pages"
)]
struct Cli {
    /// Directory holding `templates/` and `pages/`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    store: PathBuf,

    /// Template to edit.
    #[arg(long, value_name = "ID", conflicts_with = "page", required_unless_present = "page")]
    template: Option<String>,

    /// Page to edit. Only regions its template marks overridable can change.
    #[arg(long, value_name = "ID")]
    page: Option<String>,

    /// Print the result without saving it.
    #[arg(long)]
    dry_run: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Append log output to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a blank document. A page needs the template it is layered on.
    Init {
        #[arg(long, value_name = "TEMPLATE_ID")]
        based_on: Option<String>,
    },
    /// Print the region outline.
    Show,
    /// Carve a new region out of REGION on DIRECTION's side.
    Split {
        region: String,
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// Remove a region and its contents.
    RemoveRegion { region: String },
    /// Move a region next to one of its siblings.
    MoveRegion {
        moved: String,
        target: String,
        /// Place after TARGET instead of before it.
        #[arg(long)]
        after: bool,
    },
    /// Add a widget of DEFINITION to a leaf region.
    AddWidget {
        region: String,
        definition: String,
        /// Insert at the front instead of the back.
        #[arg(long)]
        prepend: bool,
    },
    /// Remove a widget.
    RemoveWidget { widget: String },
    /// Move a widget into POSITION of region TO.
    MoveWidget {
        widget: String,
        from: String,
        to: String,
        position: usize,
    },
    /// Set a region's size along its parent's axis, in pixels.
    Resize { region: String, px: u32 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    North,
    South,
    East,
    West,
}

impl From<DirectionArg> for InsertDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::North => InsertDirection::North,
            DirectionArg::South => InsertDirection::South,
            DirectionArg::East => InsertDirection::East,
            DirectionArg::West => InsertDirection::West,
        }
    }
}

enum Editor {
    Template { id: String, session: TemplateSession },
    Page { id: String, session: PageSession },
}

impl Editor {
    fn open(cli: &Cli, store: &DirStore) -> io::Result<Self> {
        match (&cli.template, &cli.page) {
            (_, Some(id)) => Ok(Editor::Page {
                id: id.clone(),
                session: PageSession::open(store, id).map_err(other)?,
            }),
            (Some(id), None) => Ok(Editor::Template {
                id: id.clone(),
                session: TemplateSession::open(store, id).map_err(other)?,
            }),
            (None, None) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "either --template or --page is required",
            )),
        }
    }

    fn tree(&self) -> &LayoutTree {
        match self {
            Editor::Template { session, .. } => session.tree(),
            Editor::Page { session, .. } => session.tree(),
        }
    }

    fn tree_mut(&mut self) -> &mut LayoutTree {
        match self {
            Editor::Template { session, .. } => session.tree_mut(),
            Editor::Page { session, .. } => session.tree_mut(),
        }
    }

    fn to_xml(&self) -> io::Result<String> {
        match self {
            Editor::Template { session, .. } => session.to_xml(),
            Editor::Page { session, .. } => session.to_xml(),
        }
        .map_err(other)
    }

    fn save(&self, store: &DirStore) -> Result<(), SessionError> {
        match self {
            Editor::Template { id, session } => session.save(store, id),
            Editor::Page { id, session } => session.save(store, id),
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        tracing_sub::log_to_file(path)?;
    }
    tracing_sub::init_default(tracing_sub::level_for_verbosity(cli.verbose));

    let store = DirStore::new(&cli.store);
    if let Command::Init { based_on } = &cli.command {
        return init(&cli, &store, based_on.as_deref());
    }

    let mut editor = Editor::open(&cli, &store)?;
    if matches!(cli.command, Command::Show) {
        print!("{}", editor.tree());
        return Ok(());
    }

    apply(editor.tree_mut(), &cli.command)?;
    print!("{}", editor.tree());
    if cli.dry_run {
        println!("{}", editor.to_xml()?);
    } else {
        editor.save(&store).map_err(other)?;
    }
    Ok(())
}

fn apply(tree: &mut LayoutTree, command: &Command) -> io::Result<()> {
    match command {
        Command::Init { .. } | Command::Show => {}
        Command::Split { region, direction } => {
            let split = tree
                .add_region(region, (*direction).into())
                .map_err(other)?
                .ok_or_else(|| missing("region", region))?;
            eprintln!("added region {}", split.inserted);
        }
        Command::RemoveRegion { region } => {
            tree.remove_region(region)
                .map_err(other)?
                .ok_or_else(|| missing("region", region))?;
        }
        Command::MoveRegion {
            moved,
            target,
            after,
        } => tree.move_region(moved, target, !after).map_err(other)?,
        Command::AddWidget {
            region,
            definition,
            prepend,
        } => {
            let widget = tree.new_widget(definition.as_str());
            let id = widget.id().clone();
            tree.add_widget(widget, region, !prepend).map_err(other)?;
            eprintln!("added widget {id}");
        }
        Command::RemoveWidget { widget } => {
            tree.remove_widget(widget)
                .map_err(other)?
                .ok_or_else(|| missing("widget", widget))?;
        }
        Command::MoveWidget {
            widget,
            from,
            to,
            position,
        } => {
            tree.order_widget(widget, from, to, *position)
                .map_err(other)?
                .ok_or_else(|| missing("widget", widget))?;
        }
        Command::Resize { region, px } => {
            let applied = tree
                .resize_region(region, *px)
                .map_err(other)?
                .ok_or_else(|| missing("region", region))?;
            if applied != *px {
                eprintln!("size clamped to {applied}px");
            }
        }
    }
    Ok(())
}

fn init(cli: &Cli, store: &DirStore, based_on: Option<&str>) -> io::Result<()> {
    let xml = match (&cli.template, &cli.page) {
        (_, Some(page_id)) => {
            let template_id = based_on.ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "a page needs --based-on")
            })?;
            let page = xml::blank_page(page_id, template_id)
                .to_xml_string()
                .map_err(other)?;
            let template = store.fetch_template(template_id).map_err(other)?;
            PageSession::load(&page, &template).map_err(other)?;
            if !cli.dry_run {
                store.persist_page(page_id, &page).map_err(other)?;
            }
            page
        }
        (Some(template_id), None) => {
            let skeleton = xml::blank_template(template_id)
                .to_xml_string()
                .map_err(other)?;
            let mut session = TemplateSession::load(&skeleton).map_err(other)?;
            session.tree_mut().create_root();
            if !cli.dry_run {
                session.save(store, template_id).map_err(other)?;
            }
            session.to_xml().map_err(other)?
        }
        (None, None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "either --template or --page is required",
            ));
        }
    };
    if cli.dry_run {
        println!("{xml}");
    }
    Ok(())
}

fn missing(kind: &str, id: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no {kind} `{id}`"))
}

fn other(err: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::other(err)
}
