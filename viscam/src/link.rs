use crate::{
    codec::ViscaCodec,
    config::{CameraConfig, CameraIdentity, LinkOptions},
    protocol::{
        classify, command::IrisAdjust, Classification, Command, CommandFrame, MenuAction,
        PresetAction, Reply,
    },
    queue::{Category, CommandQueue},
    Error, Result,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::{
    io::{Error as IoError, ErrorKind},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{split, AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    net::TcpStream,
    select,
    sync::{mpsc, oneshot},
    time::{sleep_until, Instant},
};
use tokio_util::codec::{Encoder, FramedRead};

/// A command which has been accepted by the receiver task.
struct PendingCommand {
    id: u64,
    frame: Bytes,
    responder: oneshot::Sender<Result<Reply>>,
}

impl PendingCommand {
    /// Delivers the command's outcome. Consumes the command, so this happens
    /// at most once.
    fn settle(self, result: Result<Reply>) {
        if self.responder.send(result).is_err() {
            debug!("command {}: caller went away before it settled", self.id);
        }
    }
}

/// Internal type for asynchronous message passing.
struct Submission {
    category: Category,
    command: PendingCommand,
}

#[allow(rustdoc::private_intra_doc_links)]
/// [CameraLink] controls a single VISCA camera over a byte stream.
///
/// ## General design
///
/// Each link has a receiver task ([LinkReceiver]) which owns the connection
/// and a [CommandQueue]. [CameraLink] handles encode commands, pass them to
/// the task, and wait for the outcome.
///
/// The task sends up to [`concurrency`][LinkOptions::concurrency] commands
/// at once, and matches each frame from the camera to the oldest command
/// still waiting for a reply. A command settles with the first of:
///
/// * a reply from the camera
/// * the [reply timeout][LinkOptions::reply_timeout] passing, as
///   [Error::Timeout]
/// * the connection failing, as [Error::Transport] or [Error::Disconnected]
/// * a newer command of the same [Category] replacing it before it was sent,
///   as [Error::Superseded]
///
/// If the camera stops accepting data for a whole reply timeout while a
/// command is still being written, the connection counts as failed with
/// [ErrorKind::TimedOut].
///
/// Nothing is retried. Once the connection fails, every outstanding command
/// fails and the link stops; later calls return [Error::ChannelUnavailable].
///
/// Cloned handles share the same receiver task. The task stops when every
/// handle has been dropped.
#[derive(Debug, Clone)]
pub struct CameraLink {
    identity: Arc<CameraIdentity>,
    cmd_tx: mpsc::Sender<Submission>,
    next_id: Arc<AtomicU64>,
}

impl CameraLink {
    /// Number of submissions which may be waiting for the receiver task.
    const COMMAND_CHANNEL_SIZE: usize = 16;

    /// Starts controlling a camera over `stream`.
    ///
    /// This spawns the receiver task, so must be called from within a Tokio
    /// runtime.
    pub fn new<S>(identity: CameraIdentity, options: LinkOptions, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(Self::COMMAND_CHANNEL_SIZE);
        let (reader, writer) = split(stream);
        let receiver = LinkReceiver {
            name: identity.name().to_string(),
            reader: FramedRead::new(reader, ViscaCodec),
            writer,
            outbound: BytesMut::new(),
            write_progress: Instant::now(),
            cmd_rx,
            queue: CommandQueue::new(options.concurrency),
            reply_timeout: options.reply_timeout,
        };

        debug!("{}: spawning receiver task", identity.name());
        tokio::task::spawn(receiver.run());

        Self {
            identity: Arc::new(identity),
            cmd_tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Connects to a camera over TCP, using the
    /// [`tcp`][CameraConfig::tcp] section of its configuration.
    pub async fn connect_tcp(config: &CameraConfig) -> Result<Self> {
        config.validate()?;
        let identity = config.identity()?;
        let Some(tcp) = &config.tcp else {
            return Err(Error::InvalidConfig(format!(
                "camera {}: no TCP connection configured",
                config.id
            )));
        };

        info!("{}: connecting to {}:{}...", identity.name(), tcp.host, tcp.port);
        let stream = TcpStream::connect((tcp.host.as_str(), tcp.port)).await?;
        stream.set_nodelay(true)?;
        info!("{}: connected", identity.name());
        Ok(Self::new(identity, config.link_options(), stream))
    }

    pub fn identity(&self) -> &CameraIdentity {
        &self.identity
    }

    /// `true` if the receiver task has stopped.
    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    /// Sends a [Command] to the camera, and waits for its reply.
    ///
    /// This is an escape hatch for commands without a method of their own.
    /// `category` controls which queued commands `command` may replace.
    pub async fn send_command(&self, category: Category, command: Command) -> Result<Reply> {
        let frame = CommandFrame::new(self.identity.visca_address(), command)?.to_bytes()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            "{}: submitting command {id} ({category}): {command:?}",
            self.identity.name()
        );

        // https://tokio.rs/tokio/tutorial/channels#receive-responses
        let (responder, resp_rx) = oneshot::channel();
        self.cmd_tx
            .send(Submission {
                category,
                command: PendingCommand {
                    id,
                    frame: Bytes::from(frame),
                    responder,
                },
            })
            .await
            .map_err(|_| Error::ChannelUnavailable)?;
        resp_rx.await.map_err(|_| Error::ChannelUnavailable)?
    }

    /// Pans and tilts at signed speeds.
    ///
    /// Negative `pan_speed` pans left, negative `tilt_speed` tilts down.
    /// Speeds are rounded, and clamped to `±24` (pan) and `±20` (tilt).
    /// `(0., 0.)` stops.
    pub async fn pan_tilt(&self, pan_speed: f64, tilt_speed: f64) -> Result<Reply> {
        self.send_command(Category::Move, Command::pan_tilt(pan_speed, tilt_speed))
            .await
    }

    /// Zooms at a signed speed, clamped to `±7`. Positive zooms in.
    pub async fn zoom(&self, speed: f64) -> Result<Reply> {
        self.send_command(Category::Zoom, Command::zoom(speed)).await
    }

    /// Zooms to a position in `0..=16384`.
    pub async fn set_zoom_position(&self, position: i32) -> Result<Reply> {
        self.send_command(Category::Zoom, Command::zoom_to(position)?)
            .await
    }

    pub async fn get_zoom_position(&self) -> Result<u16> {
        let reply = self
            .send_command(Category::Uncategorized, Command::ZoomPositionInquiry)
            .await?;
        reply
            .position()
            .map_err(|_| Error::MalformedReply(reply.into_inner()))
    }

    pub async fn widen_iris(&self) -> Result<Reply> {
        self.send_command(Category::Uncategorized, IrisAdjust::Widen.into())
            .await
    }

    pub async fn narrow_iris(&self) -> Result<Reply> {
        self.send_command(Category::Uncategorized, IrisAdjust::Narrow.into())
            .await
    }

    pub async fn reset_iris(&self) -> Result<Reply> {
        self.send_command(Category::Uncategorized, IrisAdjust::Reset.into())
            .await
    }

    /// Sets the iris to a position in `0..=17`.
    pub async fn set_iris_position(&self, position: i32) -> Result<Reply> {
        self.send_command(Category::Uncategorized, Command::iris_to(position)?)
            .await
    }

    pub async fn get_iris_position(&self) -> Result<u16> {
        let reply = self
            .send_command(Category::Uncategorized, Command::IrisPositionInquiry)
            .await?;
        reply
            .position()
            .map_err(|_| Error::MalformedReply(reply.into_inner()))
    }

    /// Sets, recalls or clears on-camera preset `preset` (`0..=15`).
    pub async fn on_camera_preset(&self, preset: i32, action: PresetAction) -> Result<Reply> {
        self.send_command(Category::Preset, Command::preset(preset, action)?)
            .await
    }

    pub async fn set_on_camera_preset(&self, preset: i32) -> Result<Reply> {
        self.on_camera_preset(preset, PresetAction::Set).await
    }

    pub async fn recall_on_camera_preset(&self, preset: i32) -> Result<Reply> {
        self.on_camera_preset(preset, PresetAction::Recall).await
    }

    pub async fn clear_on_camera_preset(&self, preset: i32) -> Result<Reply> {
        self.on_camera_preset(preset, PresetAction::Clear).await
    }

    /// [on_camera_preset][Self::on_camera_preset], with the action given by
    /// name (`set`, `recall` or `clear`, in any case).
    pub async fn preset(&self, preset: i32, action: &str) -> Result<Reply> {
        self.on_camera_preset(preset, action.parse::<PresetAction>()?)
            .await
    }

    pub async fn menu(&self, action: MenuAction) -> Result<Reply> {
        self.send_command(Category::Menu, Command::menu(action))
            .await
    }

    pub async fn is_menu_showing(&self) -> Result<bool> {
        let reply = self
            .send_command(Category::Uncategorized, Command::MenuStatusInquiry)
            .await?;
        reply
            .menu_showing()
            .map_err(|_| Error::MalformedReply(reply.into_inner()))
    }

    /// Shows the OSD menu if it is hidden, or hides it if it is showing.
    pub async fn menu_toggle(&self) -> Result<Reply> {
        let action = if self.is_menu_showing().await? {
            MenuAction::Off
        } else {
            MenuAction::On
        };
        self.menu(action).await
    }
}

/// Receiver task for a [CameraLink].
///
/// This owns the connection and the [CommandQueue]; nothing else touches
/// either.
struct LinkReceiver<S> {
    /// Camera name, for logs.
    name: String,
    reader: FramedRead<ReadHalf<S>, ViscaCodec>,
    writer: WriteHalf<S>,
    /// Encoded commands which haven't been fully written yet.
    outbound: BytesMut,
    /// When `outbound` last shrank, or last became non-empty.
    write_progress: Instant,
    cmd_rx: mpsc::Receiver<Submission>,
    queue: CommandQueue<PendingCommand>,
    reply_timeout: Duration,
}

impl<S> LinkReceiver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Stands in for deadlines too far away to represent.
    const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

    async fn run(mut self) {
        let reason = match self.main_loop().await {
            Ok(()) => {
                debug!("{}: all handles dropped, stopping", self.name);
                Error::ChannelUnavailable
            }
            Err(e) => {
                error!("{}: connection failed: {e}", self.name);
                e
            }
        };

        // Refuse new submissions before failing the ones we have, so that
        // callers see the link as closed once their command settles.
        self.cmd_rx.close();
        let mut failed: Vec<PendingCommand> = self.queue.drain_dispatched().collect();
        failed.extend(self.queue.drain_waiting());
        while let Ok(submission) = self.cmd_rx.try_recv() {
            failed.push(submission.command);
        }

        if !failed.is_empty() {
            warn!("{}: failing {} outstanding command(s)", self.name, failed.len());
        }
        for command in failed {
            command.settle(Err(match &reason {
                Error::Transport(e) => Error::Transport(Arc::clone(e)),
                Error::Disconnected => Error::Disconnected,
                _ => Error::ChannelUnavailable,
            }));
        }
    }

    /// Main event loop.
    ///
    /// Submissions are handled before frames from the camera, so a burst of
    /// submissions is coalesced before any replies are processed.
    ///
    /// Writes happen here too, so a camera which stops reading can't hold up
    /// replies or timeouts.
    ///
    /// Returns `Ok(())` when every [CameraLink] handle has been dropped, or
    /// an error when the connection fails.
    async fn main_loop(&mut self) -> Result {
        loop {
            let deadline = self.queue.earliest_deadline();

            select! {
                biased;

                submission = self.cmd_rx.recv() => {
                    let Some(submission) = submission else {
                        return Ok(());
                    };
                    self.handle_submission(submission);
                }

                frame = self.reader.next() => {
                    match frame {
                        Some(Ok(frame)) => self.handle_frame(frame),
                        Some(Err(e)) => return Err(Error::Transport(Arc::new(e))),
                        None => return Err(Error::Disconnected),
                    }
                }

                written = self.writer.write_buf(&mut self.outbound), if !self.outbound.is_empty() => {
                    match written {
                        Ok(0) => return Err(Error::Transport(Arc::new(ErrorKind::WriteZero.into()))),
                        Ok(n) => {
                            trace!("{}: wrote {n} bytes, {} left", self.name, self.outbound.len());
                            self.write_progress = Instant::now();
                        }
                        Err(e) => return Err(Error::Transport(Arc::new(e))),
                    }
                }

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_timeouts()?;
                }
            }

            self.dispatch_ready()?;
        }
    }

    fn handle_submission(&mut self, submission: Submission) {
        let Submission { category, command } = submission;
        let id = command.id;
        if let Some(old) = self.queue.submit(category, command) {
            warn!(
                "{}: command {} superseded by command {id} ({category})",
                self.name, old.id
            );
            old.settle(Err(Error::Superseded));
        }
        debug!(
            "{}: queued command {id}; {}/{} in flight, {} waiting",
            self.name,
            self.queue.in_flight(),
            self.queue.concurrency(),
            self.queue.pending()
        );
    }

    fn handle_frame(&mut self, frame: BytesMut) {
        trace!("{}: <<< {}", self.name, hex::encode(&frame));
        let Some(command) = self.queue.pop_oldest() else {
            warn!(
                "{}: dropping unsolicited frame: {}",
                self.name,
                hex::encode(&frame)
            );
            return;
        };

        let result = match classify(&frame) {
            Classification::Success(reply) => Ok(reply),
            Classification::Error(code) => {
                debug!("{}: command {} failed: {code}", self.name, command.id);
                Err(Error::Camera(code))
            }
            Classification::Foreign => Err(Error::MalformedReply(frame.to_vec())),
        };
        command.settle(result);
    }

    /// `reply_timeout` after `from`.
    fn reply_deadline(&self, from: Instant) -> Instant {
        from.checked_add(self.reply_timeout)
            .unwrap_or_else(|| from + Self::FAR_FUTURE)
    }

    /// Fails commands whose deadline has passed.
    ///
    /// Returns an error if the camera has also stopped accepting data,
    /// because any partly-written frame leaves the stream unusable.
    fn handle_timeouts(&mut self) -> Result {
        let now = Instant::now();
        for command in self.queue.take_expired(now) {
            warn!("{}: command {} timed out", self.name, command.id);
            command.settle(Err(Error::Timeout));
        }

        if !self.outbound.is_empty() && now >= self.reply_deadline(self.write_progress) {
            return Err(Error::Transport(Arc::new(IoError::new(
                ErrorKind::TimedOut,
                format!("camera stopped reading, {} bytes unsent", self.outbound.len()),
            ))));
        }
        Ok(())
    }

    /// Queues waiting commands for writing while there are free slots.
    fn dispatch_ready(&mut self) -> Result {
        let deadline = self.reply_deadline(Instant::now());
        while let Some(command) = self.queue.next_ready(deadline) {
            trace!("{}: >>> {}: {}", self.name, command.id, hex::encode(&command.frame));
            if self.outbound.is_empty() {
                self.write_progress = Instant::now();
            }
            ViscaCodec
                .encode(command.frame.clone(), &mut self.outbound)
                .map_err(|e| Error::Transport(Arc::new(e)))?;
        }
        Ok(())
    }
}
