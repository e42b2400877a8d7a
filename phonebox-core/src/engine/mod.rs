//! Node protocol engine
//!
//! Owns the server connection, the in-flight frame and the update session.
//! Each [`NodeEngine::tick`] reconnects if needed, then runs one handler per
//! buffered input, chosen by the current [`Status`], and answers according
//! to [`Status::step`].
//!
//! The engine never restarts the device itself. When a restart is due it
//! returns [`Tick::Restart`] and the board glue performs it.

use embedded_hal::delay::DelayNs;
use embedded_io::Error as _;
use phonebox_hal::{Endpoint, FileStore, OpenMode, StoragePath, StoredFile, Transport};
use phonebox_protocol::codec::read_u8;
use phonebox_protocol::{
    read_packet_kind, Frame, UpdateAnnouncement, ACK_PACKET, HEADER_PACKET, NACK_PACKET, OPEN_TAG,
};

use crate::config::{NodeConfig, MAX_CHUNK_SIZE};
use crate::state::{Effect, ErrorKind, Event, Reply, Status, Step};
use crate::traits::{Indicators, IoChain};
use crate::update::{store_version, Progress, UpdateSession};

/// Why the engine wants the device restarted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartReason {
    /// A complete image was received
    UpdateReceived,
    /// A pending image was installed at boot
    UpdateInstalled,
    /// The server could not be reached within the retry budget
    RetriesExhausted,
}

/// Result of one engine tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Keep calling [`NodeEngine::tick`]
    Continue,
    /// Restart the device
    Restart(RestartReason),
}

/// Protocol engine for one node
pub struct NodeEngine<T, S, C, I, D>
where
    S: FileStore,
{
    config: NodeConfig,
    transport: T,
    store: S,
    chain: C,
    indicators: I,
    delay: D,
    status: Status,
    frame: Frame,
    session: Option<UpdateSession>,
    firmware: Option<S::File>,
    retries: u8,
}

impl<T, S, C, I, D> NodeEngine<T, S, C, I, D>
where
    T: Transport,
    S: FileStore,
    C: IoChain,
    I: Indicators,
    D: DelayNs,
{
    /// Create an engine in [`Status::Idle`]
    ///
    /// No connection is attempted until the first tick.
    pub fn new(
        config: NodeConfig,
        transport: T,
        store: S,
        chain: C,
        indicators: I,
        delay: D,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            chain,
            indicators,
            delay,
            status: Status::Idle,
            frame: Frame::empty(),
            session: None,
            firmware: None,
            retries: 0,
        }
    }

    /// Run ticks until a restart is requested
    pub fn run(&mut self) -> RestartReason {
        loop {
            if let Tick::Restart(reason) = self.tick() {
                return reason;
            }
        }
    }

    /// Service the connection once
    ///
    /// Reconnects if the link is down, then handles input for as long as
    /// bytes are buffered.
    pub fn tick(&mut self) -> Tick {
        if !self.transport.connected() {
            if self.status.is_updating() {
                warn!("Connection lost during software update in {:?}", self.status);
            }
            if let Err(reason) = self.connect() {
                return Tick::Restart(reason);
            }
        }

        while self.bytes_ready() {
            let event = self.handle();
            let step = self.status.step(event);

            if let Event::Failed(kind) = event {
                error!("Error occurred in {:?}: {:?}", self.status, kind);
            }

            if let Some(reason) = self.apply(step) {
                return Tick::Restart(reason);
            }
        }

        Tick::Continue
    }

    /// Connect to the server and send the node address
    ///
    /// Blocks with a fixed backoff between attempts. Failed attempts are
    /// counted over the life of the engine and never reset, so a link that
    /// keeps dropping eventually exhausts the retry budget and a restart is
    /// requested. A successful connection resets the status.
    pub fn connect(&mut self) -> Result<(), RestartReason> {
        let policy = self.config.retry;

        loop {
            let endpoint = Endpoint::new(self.config.server_host.as_str(), self.config.server_port);
            info!("Connecting to {}:{}", endpoint.host, endpoint.port);

            match endpoint.connect(&mut self.transport) {
                Ok(()) => break,
                Err(e) => {
                    self.retries = self.retries.saturating_add(1);
                    warn!(
                        "Connection failed ({:?}), retry {}/{}",
                        e.kind(),
                        self.retries,
                        policy.max_retries
                    );
                    if self.retries > policy.max_retries {
                        error!("Retries exhausted");
                        return Err(RestartReason::RetriesExhausted);
                    }
                    self.delay.delay_ms(policy.backoff_ms);
                }
            }
        }

        info!("Connected, node address {}", self.config.node_address);
        self.send(&[self.config.node_address]);
        self.enter_idle();
        Ok(())
    }

    /// Current connection status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Last processed frame
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Current or last update session
    pub fn session(&self) -> Option<&UpdateSession> {
        self.session.as_ref()
    }

    /// Failed connection attempts since the engine was created
    pub fn retry_count(&self) -> u8 {
        self.retries
    }

    /// Active configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Server connection
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Server connection, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// File store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// File store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Module chain
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Indicator outputs
    pub fn indicators(&self) -> &I {
        &self.indicators
    }

    /// Delay provider
    pub fn delay(&self) -> &D {
        &self.delay
    }

    fn bytes_ready(&mut self) -> bool {
        match self.transport.read_ready() {
            Ok(ready) => ready,
            Err(e) => {
                warn!("Read-ready check failed: {:?}", e.kind());
                false
            }
        }
    }

    fn handle(&mut self) -> Event {
        match self.status {
            Status::Idle => self.handle_idle(),
            Status::Header => self.handle_header(),
            Status::UpdateInit => self.handle_update_init(),
            Status::UpdateBusy => self.handle_update_chunk(),
            Status::Payload => self.handle_payload(),
            Status::UpdateStart | Status::UpdateDone | Status::Ready => Event::Nothing,
        }
    }

    fn handle_idle(&mut self) -> Event {
        match read_u8(&mut self.transport) {
            Ok(OPEN_TAG) => Event::OpenTag,
            Ok(_) => Event::Discarded,
            Err(e) => Event::Failed(ErrorKind::from(&e)),
        }
    }

    fn handle_header(&mut self) -> Event {
        match read_packet_kind(&mut self.transport, OPEN_TAG) {
            Ok(kind) => {
                debug!("Packet header {:?}", kind);
                Event::PacketHeader(kind)
            }
            Err(e) => Event::Failed(ErrorKind::from(&e)),
        }
    }

    fn handle_update_init(&mut self) -> Event {
        info!("Software update");
        self.close_firmware();

        match self.store.open(StoragePath::Firmware, OpenMode::Write) {
            Ok(file) => self.firmware = Some(file),
            Err(e) => {
                error!("Error opening firmware file for writing: {:?}", e);
                return Event::Failed(ErrorKind::Storage);
            }
        }

        let announcement = match UpdateAnnouncement::read(&mut self.transport) {
            Ok(announcement) => announcement,
            Err(e) => return Event::Failed(ErrorKind::from(&e)),
        };

        let session = UpdateSession::new(&announcement);
        info!("New software update available: {}", session.version());
        self.session = Some(session);
        Event::UpdateAnnounced
    }

    fn handle_update_chunk(&mut self) -> Event {
        let mut buffer = [0u8; MAX_CHUNK_SIZE];
        let len = self.config.chunk_len();

        let received = match self.transport.read(&mut buffer[..len]) {
            Ok(0) => {
                error!("Server closed during download");
                return Event::Failed(ErrorKind::Transport);
            }
            Ok(n) => n,
            Err(e) => {
                error!("Failed to read data from socket: {:?}", e.kind());
                return Event::Failed(ErrorKind::Transport);
            }
        };

        let (Some(file), Some(session)) = (self.firmware.as_mut(), self.session.as_mut()) else {
            error!("Chunk received without an open update");
            return Event::Failed(ErrorKind::Storage);
        };

        let mut written = 0;
        while written < received {
            match file.write(&buffer[written..received]) {
                Ok(0) | Err(_) => {
                    error!("File write error");
                    return Event::Failed(ErrorKind::Storage);
                }
                Ok(n) => written += n,
            }
        }

        let progress = session.accept(received);
        debug!(
            "Downloading software update {} / {}",
            session.received(),
            session.declared()
        );
        self.indicators.toggle_status();

        match progress {
            Progress::Busy => Event::ChunkAccepted { complete: false },
            Progress::Complete => {
                self.close_firmware();
                Event::ChunkAccepted { complete: true }
            }
        }
    }

    fn handle_payload(&mut self) -> Event {
        let mut frame = match Frame::read_body(&mut self.transport, HEADER_PACKET) {
            Ok(frame) => frame,
            Err(e) => return Event::Failed(ErrorKind::from(&e)),
        };

        self.indicators.set_alarm(frame.alarm_on());
        self.indicators.set_buzzer(frame.buzzer_on());
        self.chain.transfer(&mut frame.modules);
        frame.size = self.chain.module_count() as u16;

        trace!("Frame processed, {} modules", frame.size);
        self.frame = frame;
        Event::PayloadProcessed
    }

    fn apply(&mut self, step: Step) -> Option<RestartReason> {
        if let Some(Effect::PersistVersionAndRestart) = step.effect {
            return self.finish_update();
        }

        match step.reply {
            Reply::None => {}
            Reply::Ack => self.send(&ACK_PACKET),
            Reply::Nack => self.send(&NACK_PACKET),
            Reply::Frame => {
                let bytes = self.frame.to_bytes();
                self.send(&bytes);
            }
        }

        if step.next == Status::UpdateBusy && self.status != Status::UpdateBusy {
            info!("Downloading latest version");
        }

        if step.next == Status::Idle {
            self.enter_idle();
        } else {
            self.status = step.next;
        }
        None
    }

    /// Persist the version, acknowledge and request the restart
    ///
    /// The restart is unconditional. A version record that cannot be
    /// written is logged and the image stays pending for the next boot.
    fn finish_update(&mut self) -> Option<RestartReason> {
        match self.session {
            Some(session) => {
                if let Err(e) = store_version(&mut self.store, &session.version()) {
                    error!("Failed to persist version record: {:?}", e);
                }
            }
            None => error!("Update finished without a session"),
        }

        self.close_firmware();
        self.status = Status::UpdateDone;
        self.send(&ACK_PACKET);
        info!("Download complete, resetting in {} ms", self.config.restart_delay_ms);
        self.delay.delay_ms(self.config.restart_delay_ms);
        Some(RestartReason::UpdateReceived)
    }

    /// Return to idle; an interrupted download keeps its stored bytes
    fn enter_idle(&mut self) {
        self.close_firmware();
        self.status = Status::Idle;
    }

    fn close_firmware(&mut self) {
        if let Some(file) = self.firmware.take() {
            if let Err(e) = file.close() {
                warn!("Failed to close firmware file: {:?}", e);
            }
        }
    }

    fn send(&mut self, data: &[u8]) {
        if let Err(e) = self.transport.write_all(data).and_then(|()| self.transport.flush()) {
            warn!("Reply write failed: {:?}", e.kind());
        }
    }
}
