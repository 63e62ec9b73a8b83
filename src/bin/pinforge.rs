use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pinforge", version)]
struct Cli {
    /// Pinterest API base URL.
    #[arg(long, global = true, default_value = pinforge::API_BASE)]
    api_base: String,

    /// Token file (defaults to $PINFORGE_TOKEN_FILE or ~/.config/pinforge/token).
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the pin and write it as a PNG.
    Still(StillArgs),
    /// Record the zoom animation (requires `ffmpeg`).
    Video(VideoArgs),
    /// Generate variations for a keyword and write one still per variation.
    Generate(GenerateArgs),
    /// Print the headline size and line breaks chosen for a text.
    Fit(FitArgs),
    /// Print the OAuth authorization URL.
    AuthUrl(AuthUrlArgs),
    /// Store an access token, or wait for one to appear.
    Login(LoginArgs),
    /// Forget the stored access token.
    Logout,
    /// List the account's boards.
    Boards,
    /// List the sections of a board.
    Sections(SectionsArgs),
    /// Create a pin from a PNG.
    Publish(PublishArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Style JSON (camelCase fields); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Background image; the gradient fallback is used when omitted.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Override the configured headline.
    #[arg(long)]
    headline: Option<String>,

    /// Extra directory of font files.
    #[arg(long)]
    font_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct StillArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output file, or a directory to write `pin-<slug>.png` into.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[arg(long, default_value_t = 8000)]
    duration_ms: u64,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Output file, or a directory to write `pin-video-<slug>.<ext>` into.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[arg(long)]
    keyword: String,

    /// Style JSON (camelCase fields); the headline comes from each variation.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra directory of font files.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Gemini API base URL. The key is read from $GEMINI_API_KEY.
    #[arg(long, default_value = pinforge::GEMINI_API_BASE)]
    gemini_base: String,

    /// Paint the gradient fallback instead of generating backgrounds.
    #[arg(long)]
    no_images: bool,

    /// Directory for the stills and `variations.json`.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FitArgs {
    #[arg(long)]
    text: String,

    /// Font preset name or CSS-like family list.
    #[arg(long, default_value = "Bold Sans")]
    font: String,

    #[arg(long, default_value_t = 1000)]
    width: u32,

    #[arg(long, default_value_t = 1500)]
    height: u32,
}

#[derive(Parser, Debug)]
struct AuthUrlArgs {
    #[arg(long)]
    client_id: String,

    #[arg(long)]
    redirect_uri: String,

    /// Anti-forgery state; random when omitted.
    #[arg(long)]
    state: Option<String>,
}

#[derive(Parser, Debug)]
struct LoginArgs {
    /// Access token to store. Without it, wait for another process to write the token file.
    #[arg(long)]
    token: Option<String>,

    /// Check the token against the API before storing it.
    #[arg(long)]
    verify: bool,
}

#[derive(Parser, Debug)]
struct SectionsArgs {
    #[arg(long)]
    board: String,
}

#[derive(Parser, Debug)]
struct PublishArgs {
    #[arg(long)]
    board: String,

    #[arg(long)]
    section: Option<String>,

    /// ISO-8601 time to schedule the pin for.
    #[arg(long)]
    publish_at: Option<String>,

    /// PNG to upload.
    #[arg(long)]
    image: PathBuf,

    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    description: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Still(ref args) => cmd_still(args),
        Command::Video(ref args) => cmd_video(args),
        Command::Generate(ref args) => cmd_generate(args),
        Command::Fit(ref args) => cmd_fit(args),
        Command::AuthUrl(ref args) => cmd_auth_url(args),
        Command::Login(ref args) => cmd_login(&cli, args),
        Command::Logout => cmd_logout(&cli),
        Command::Boards => cmd_boards(&cli),
        Command::Sections(ref args) => cmd_sections(&cli, args),
        Command::Publish(ref args) => cmd_publish(&cli, args),
    }
}

struct Scene {
    style: pinforge::StyleConfig,
    background: Option<pinforge::DecodedImage>,
    renderer: pinforge::FrameRenderer,
    surface: pinforge::Surface,
}

fn font_book(font_dir: Option<&Path>) -> pinforge::FontBook {
    let mut book = pinforge::FontBook::system();
    if let Some(dir) = font_dir {
        book.load_fonts_dir(dir);
    }
    book
}

fn load_scene(args: &SceneArgs) -> anyhow::Result<Scene> {
    let mut style = match &args.config {
        Some(p) => pinforge::StyleConfig::from_path(p)?,
        None => pinforge::StyleConfig::default(),
    };
    if let Some(h) = &args.headline {
        style.headline = h.clone();
    }

    let background = match &args.background {
        Some(p) => {
            let bytes =
                std::fs::read(p).with_context(|| format!("read background '{}'", p.display()))?;
            match pinforge::DecodedImage::decode(&bytes) {
                Ok(img) => Some(img),
                Err(e) => {
                    tracing::warn!(error = %e, path = %p.display(), "background unusable, using fallback");
                    None
                }
            }
        }
        None => None,
    };

    Ok(Scene {
        style,
        background,
        renderer: pinforge::FrameRenderer::new(font_book(args.font_dir.as_deref())),
        surface: pinforge::Surface::pin()?,
    })
}

fn resolve_out(out: &Path, file_name: &str) -> anyhow::Result<PathBuf> {
    let path = if out.is_dir() {
        out.join(file_name)
    } else {
        out.to_path_buf()
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(path)
}

fn cmd_still(args: &StillArgs) -> anyhow::Result<()> {
    let mut scene = load_scene(&args.scene)?;
    let background = scene.background.as_ref().into();
    scene
        .renderer
        .render_frame(&mut scene.surface, &scene.style, background, 1.0)?;

    let still = pinforge::export_still(&scene.surface, &scene.style.headline)?;
    let out = resolve_out(&args.out, &still.file_name)?;
    std::fs::write(&out, &still.bytes).with_context(|| format!("write png '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_video(args: &VideoArgs) -> anyhow::Result<()> {
    let mut scene = load_scene(&args.scene)?;
    let anim = pinforge::ZoomAnimation {
        duration_ms: args.duration_ms,
        fps: args.fps,
        ..pinforge::ZoomAnimation::default()
    };
    anim.validate()?;

    let mut exporter = pinforge::VideoExporter::new(anim);
    let sink = pinforge::FfmpegSink::new(pinforge::FfmpegSinkOpts::default());
    let mut clock = pinforge::FixedStepClock::new(anim.frame_rate()?);

    let background = scene.background.as_ref().into();
    let video = pinforge::record_zoom_video(
        &mut exporter,
        Box::new(sink),
        &mut clock,
        &mut scene.renderer,
        &mut scene.surface,
        &scene.style,
        background,
    )?;

    let name = pinforge::video_file_name(&scene.style.headline, video.container);
    let out = resolve_out(&args.out, &name)?;
    std::fs::write(&out, &video.bytes)
        .with_context(|| format!("write video '{}'", out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {})",
        out.display(),
        video.frame_count,
        video.mime_type()
    );
    Ok(())
}

fn cmd_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let mut provider = pinforge::GeminiClient::from_env(&args.gemini_base)?;
    let style = match &args.config {
        Some(p) => pinforge::StyleConfig::from_path(p)?,
        None => pinforge::StyleConfig::default(),
    };

    let mut studio = pinforge::PinStudio::new(
        pinforge::FrameRenderer::new(font_book(args.font_dir.as_deref())),
        pinforge::Surface::pin()?,
    );
    studio.update_style(|s| *s = style)?;
    let count = studio.generate(&mut provider, &args.keyword)?;
    if count == 0 {
        anyhow::bail!("keyword is blank");
    }
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    for i in 0..count {
        studio.select_variation(i)?;
        if !args.no_images && studio.ensure_background(&mut provider).is_fallback() {
            eprintln!(
                "variation {}: background unavailable ({}), using the gradient",
                i + 1,
                studio.last_error().unwrap_or("unknown error")
            );
        }
        studio.render()?;

        let still = studio.export_still()?;
        let out = args.out.join(format!("{:02}-{}", i + 1, still.file_name));
        std::fs::write(&out, &still.bytes)
            .with_context(|| format!("write png '{}'", out.display()))?;
        println!("{}\t{}", out.display(), studio.style().headline);
    }

    let variations: Vec<_> = studio.variations().iter().map(|s| &s.variation).collect();
    let meta = args.out.join("variations.json");
    std::fs::write(&meta, serde_json::to_vec_pretty(&variations)?)
        .with_context(|| format!("write '{}'", meta.display()))?;
    eprintln!("wrote {count} variations to {}", args.out.display());
    Ok(())
}

fn cmd_fit(args: &FitArgs) -> anyhow::Result<()> {
    let canvas = pinforge::Canvas {
        width: args.width,
        height: args.height,
    };
    canvas.validate()?;

    let family = pinforge::font_preset(&args.font).map_or(args.font.as_str(), |p| p.value);
    let mut engine = pinforge::TextEngine::new(font_book(None));
    let font = engine.font_for(family)?;
    eprintln!("font: {}", font.family);

    let style = pinforge::StyleConfig::default();
    let mut measurer = engine.measurer(&font);
    let Some(layout) = pinforge::layout_headline(
        &args.text,
        canvas,
        style.text_y_pos,
        pinforge::FitParams::default(),
        &mut measurer,
    ) else {
        println!("0");
        return Ok(());
    };

    println!("{}", layout.size_px);
    for line in &layout.lines {
        eprintln!("  {line}");
    }
    Ok(())
}

fn cmd_auth_url(args: &AuthUrlArgs) -> anyhow::Result<()> {
    let cfg = pinforge::OAuthConfig {
        client_id: args.client_id.clone(),
        redirect_uri: args.redirect_uri.clone(),
    };
    let state = match &args.state {
        Some(s) => s.clone(),
        None => random_state(),
    };
    println!("{}", cfg.authorize_url(&state)?);
    Ok(())
}

fn random_state() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seed = nanos.to_le_bytes();
    let pid = std::process::id().to_le_bytes();
    STANDARD
        .encode([&seed[..8], &pid[..]].concat())
        .trim_end_matches('=')
        .replace(['+', '/'], "x")
}

fn credential_store(cli: &Cli) -> anyhow::Result<pinforge::FileCredentialStore> {
    Ok(match &cli.token_file {
        Some(p) => pinforge::FileCredentialStore::new(p),
        None => pinforge::FileCredentialStore::from_env()?,
    })
}

fn client(cli: &Cli) -> anyhow::Result<pinforge::PinterestClient> {
    let store = credential_store(cli)?;
    pinforge::PinterestClient::from_store(&store, &cli.api_base)
        .context("run `pinforge login` first")
}

fn cmd_login(cli: &Cli, args: &LoginArgs) -> anyhow::Result<()> {
    use pinforge::CredentialStore as _;

    let mut store = credential_store(cli)?;
    let Some(token) = &args.token else {
        eprintln!("waiting for a token in '{}'", store.path().display());
        if !pinforge::wait_for_connection(
            &store,
            pinforge::DEFAULT_POLL_INTERVAL,
            pinforge::DEFAULT_POLL_TIMEOUT,
        ) {
            anyhow::bail!("no token appeared within the login window");
        }
        eprintln!("connected");
        return Ok(());
    };

    if token.trim().len() <= 10 {
        anyhow::bail!("token is too short to be valid");
    }
    if args.verify {
        let client = pinforge::PinterestClient::with_base(token.clone(), &cli.api_base)?;
        let user = client
            .fetch_user()
            .context("The manual token provided is invalid or expired.")?;
        eprintln!("logged in as {}", user.username);
    }
    store.set(token)?;
    eprintln!("token stored in {}", store.path().display());
    Ok(())
}

fn cmd_logout(cli: &Cli) -> anyhow::Result<()> {
    use pinforge::CredentialStore as _;

    credential_store(cli)?.clear()?;
    eprintln!("logged out");
    Ok(())
}

fn cmd_boards(cli: &Cli) -> anyhow::Result<()> {
    for board in client(cli)?.list_boards()? {
        println!("{}\t{}", board.id, board.name);
    }
    Ok(())
}

fn cmd_sections(cli: &Cli, args: &SectionsArgs) -> anyhow::Result<()> {
    for section in client(cli)?.list_sections(&args.board)? {
        println!("{}\t{}", section.id, section.name);
    }
    Ok(())
}

fn cmd_publish(cli: &Cli, args: &PublishArgs) -> anyhow::Result<()> {
    use pinforge::CredentialStore as _;

    let png = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    let pin = pinforge::CreatePin {
        board_id: args.board.clone(),
        board_section_id: args.section.clone(),
        title: args.title.clone(),
        description: args.description.clone(),
        image_base64: STANDARD.encode(&png),
        publish_at: args.publish_at.clone(),
    };

    match client(cli)?.create_pin(&pin) {
        Ok(created) => {
            println!("{}", created.id);
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            credential_store(cli)?.clear()?;
            anyhow::bail!(pinforge::SESSION_EXPIRED)
        }
        Err(e) => Err(e.into()),
    }
}
