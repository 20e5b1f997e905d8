use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use viscam::{
    protocol::{command::IrisAdjust, MenuAction, PresetAction},
    CameraConfig, CameraId, CameraLink, Result, TcpConfig,
};

/// Sends a single command to a VISCA camera over TCP.
#[derive(Debug, Parser)]
#[clap(verbatim_doc_comment)]
struct CliParser {
    /// Hostname or IP address of the camera.
    #[clap(short, long)]
    pub host: String,

    /// TCP port of the camera's VISCA service.
    #[clap(short, long, default_value_t = 5678)]
    pub port: u16,

    /// VISCA address of the camera.
    #[clap(short, long, default_value_t = 1)]
    pub address: u8,

    #[clap(subcommand)]
    pub command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Pan and tilt for a while, then stop.
    Move {
        #[clap(allow_negative_numbers = true)]
        pan: f64,
        #[clap(allow_negative_numbers = true)]
        tilt: f64,
        /// How long to move for, in milliseconds.
        #[clap(long, default_value_t = 500)]
        duration: u64,
    },

    /// Zoom to an absolute position (0 - 16384).
    Zoom { position: i32 },

    /// Adjust the iris.
    Iris {
        #[clap(value_enum)]
        adjust: IrisAdjust,
    },

    /// Set, recall or clear an on-camera preset (0 - 15).
    Preset {
        #[clap(value_enum)]
        action: PresetAction,
        id: i32,
    },

    /// Control the OSD menu.
    Menu {
        #[clap(value_enum)]
        action: Option<MenuAction>,
    },

    /// Print the zoom and iris positions, and whether the menu is showing.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .compact()
        .init();
    let opts = CliParser::parse();

    let mut config = CameraConfig::new(CameraId(1));
    config.visca_address = opts.address;
    config.tcp = Some(TcpConfig {
        host: opts.host,
        port: opts.port,
    });
    let camera = CameraLink::connect_tcp(&config).await?;

    match opts.command {
        Cmd::Move {
            pan,
            tilt,
            duration,
        } => {
            camera.pan_tilt(pan, tilt).await?;
            tokio::time::sleep(Duration::from_millis(duration)).await;
            camera.pan_tilt(0., 0.).await?;
        }
        Cmd::Zoom { position } => {
            camera.set_zoom_position(position).await?;
        }
        Cmd::Iris { adjust } => {
            match adjust {
                IrisAdjust::Widen => camera.widen_iris().await?,
                IrisAdjust::Narrow => camera.narrow_iris().await?,
                IrisAdjust::Reset => camera.reset_iris().await?,
            };
        }
        Cmd::Preset { action, id } => {
            camera.on_camera_preset(id, action).await?;
        }
        Cmd::Menu { action: None } => {
            camera.menu_toggle().await?;
        }
        Cmd::Menu {
            action: Some(action),
        } => {
            camera.menu(action).await?;
        }
        Cmd::Status => {
            info!("Zoom position: {}", camera.get_zoom_position().await?);
            info!("Iris position: {}", camera.get_iris_position().await?);
            info!("Menu showing: {}", camera.is_menu_showing().await?);
        }
    }

    Ok(())
}
