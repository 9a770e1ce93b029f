//! Per-frame control loop
//!
//! One [`FrameDriver::run_frame`] call walks the frame state machine once:
//!
//! ```text
//! Idle -> Acquiring -> Recording -> Submitted -> Presenting -> Idle
//! ```
//!
//! The default [`FramePacing::Blocking`] policy keeps exactly one frame in
//! flight and idles the device at the end of every frame, so the next frame
//! can reset the command pool and reuse the sync pair freely. Pipelined pacing
//! keeps several fenced slots and only blocks before reusing a slot whose
//! previous submission has not retired. Its release signals belong to chain
//! images rather than slots.
//!
//! Any error other than an absorbed out-of-date chain moves the driver to
//! [`FrameState::Failed`]; from there it can only be dropped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::commands::{ActiveRenderPass, CommandSurface};
use crate::device::{AcquiredImage, ClearColor, Extent2D, PresentStatus, PresentationDevice, SubmitInfo};
use crate::error::{PresentError, PresentResult};
use crate::swapchain::ChainDesc;
use crate::swapchain_manager::{resolve_extent, ReconcileOutcome, SwapchainManager};
use crate::sync::{Fence, Semaphore, SyncPair};
use crate::window::WindowSurface;

/// Acquire attempts per frame; the second one follows a forced recreation
const ACQUIRE_ATTEMPTS: u32 = 2;

/// Where the frame driver is in the current iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Between frames
    Idle,
    /// Waiting for a presentable image
    Acquiring,
    /// Recording the frame's commands
    Recording,
    /// Commands handed to the queue
    Submitted,
    /// Presentation requested
    Presenting,
    /// A frame hit a fatal error; no further frames
    Failed,
    /// Device idled for teardown; no further frames
    Shutdown,
}

/// How far the CPU may run ahead of the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePacing {
    /// One frame in flight; the device is idled after every present
    #[default]
    Blocking,
    /// Up to `frames_in_flight` frames queued, throttled by per-slot fences
    Pipelined {
        /// Number of frame slots
        frames_in_flight: u32,
    },
}

impl FramePacing {
    fn slot_count(self) -> PresentResult<usize> {
        match self {
            Self::Blocking => Ok(1),
            Self::Pipelined { frames_in_flight: 0 } => {
                Err(PresentError::invalid("pipelined pacing needs at least one frame in flight"))
            }
            Self::Pipelined { frames_in_flight } => Ok(frames_in_flight as usize),
        }
    }
}

/// What happened during one presented frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Index of the presented image
    pub image_index: u32,
    /// Generation of the chain the image came from
    pub generation: u64,
    /// Extent the frame was rendered at
    pub extent: Extent2D,
    /// The chain was recreated during this frame
    pub recreated: bool,
    /// The window was minimized before this frame and presentation was suspended
    pub suspended: bool,
}

/// Result of one [`FrameDriver::run_frame`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was presented
    Presented(FrameReport),
    /// The window asked to close; nothing was rendered
    Closed,
}

/// Draw workload recorded inside the frame's render pass
///
/// The driver has already begun the render pass with the clear colour and set
/// a full-extent viewport and scissor when `record` is called.
pub trait FrameRecorder<D: PresentationDevice> {
    /// Record draw commands for one frame
    fn record(&mut self, pass: &mut ActiveRenderPass<'_, D>) -> PresentResult<()>;
}

/// Recorder that draws nothing; the frame is just the clear colour
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearOnly;

impl<D: PresentationDevice> FrameRecorder<D> for ClearOnly {
    fn record(&mut self, _pass: &mut ActiveRenderPass<'_, D>) -> PresentResult<()> {
        Ok(())
    }
}

/// Frame driver construction parameters
pub struct FrameDriverDesc<D: PresentationDevice> {
    /// Fixed properties of every chain generation
    pub chain: ChainDesc<D>,
    /// Colour the render target is cleared to
    pub clear_color: ClearColor,
    /// Frame pacing policy
    pub pacing: FramePacing,
}

struct FrameSlot<D: PresentationDevice> {
    commands: CommandSurface<D>,
    sync: SyncPair<D>,
    in_flight: Option<Fence<D>>,
}

impl<D: PresentationDevice> FrameSlot<D> {
    fn new(device: &Arc<D>, queue_family: u32, fenced: bool) -> PresentResult<Self> {
        let commands = CommandSurface::new(Arc::clone(device), queue_family)?;
        let sync = SyncPair::new(device)?;
        let in_flight = if fenced {
            Some(Fence::new(Arc::clone(device), true)?)
        } else {
            None
        };

        Ok(Self {
            commands,
            sync,
            in_flight,
        })
    }
}

/// Chain extent for `window`, blocking in `wait_events` while it has zero area
///
/// Returns `None` if the window asks to close while minimized.
fn wait_for_surface<D: PresentationDevice>(
    device: &D,
    window: &mut impl WindowSurface,
    suspended: &mut bool,
) -> PresentResult<Option<Extent2D>> {
    loop {
        let extent = resolve_extent(device, window.current_extent())?;
        if !extent.is_zero_area() {
            return Ok(Some(extent));
        }
        if !*suspended {
            log::debug!("Surface has zero area, suspending presentation");
            *suspended = true;
        }
        window.wait_events();
        if window.should_close() {
            return Ok(None);
        }
    }
}

/// Drives acquire, record, submit and present against the live chain
pub struct FrameDriver<D: PresentationDevice, R: FrameRecorder<D>> {
    // Drop order: frame slots and release signals, then the chain generation.
    slots: Vec<FrameSlot<D>>,
    image_release: Vec<Semaphore<D>>,
    swapchain: SwapchainManager<D>,
    device: Arc<D>,
    recorder: R,
    render_pass: D::RenderPass,
    clear_color: ClearColor,
    pacing: FramePacing,
    current_slot: usize,
    state: FrameState,
    stale: bool,
    frames_presented: u64,
}

impl<D: PresentationDevice, R: FrameRecorder<D>> FrameDriver<D, R> {
    /// Create the first chain generation for `window`
    ///
    /// A minimized window is waited on until it has a usable size. Closing it
    /// during that wait fails with [`PresentError::InvalidOperation`].
    pub fn new(
        device: Arc<D>,
        desc: FrameDriverDesc<D>,
        window: &mut impl WindowSurface,
        recorder: R,
    ) -> PresentResult<Self> {
        let slot_count = desc.pacing.slot_count()?;
        let mut suspended = false;
        let extent = wait_for_surface(device.as_ref(), window, &mut suspended)?
            .ok_or_else(|| PresentError::invalid("window closed before its surface had a usable size"))?;
        let swapchain = SwapchainManager::new(Arc::clone(&device), desc.chain, extent)?;

        let fenced = matches!(desc.pacing, FramePacing::Pipelined { .. });
        let slots = (0..slot_count)
            .map(|_| FrameSlot::new(&device, desc.chain.queue_family, fenced))
            .collect::<PresentResult<Vec<_>>>()?;

        log::info!("Frame driver ready: {:?} pacing, {} frame slot(s)", desc.pacing, slot_count);
        Ok(Self {
            slots,
            image_release: Vec::new(),
            swapchain,
            device,
            recorder,
            render_pass: desc.chain.render_pass,
            clear_color: desc.clear_color,
            pacing: desc.pacing,
            current_slot: 0,
            state: FrameState::Idle,
            stale: false,
            frames_presented: 0,
        })
    }

    /// Run one iteration of the frame loop
    ///
    /// Blocks in `wait_events` while the window has zero area. Out-of-date
    /// chains are recreated transparently; every other error is fatal and
    /// leaves the driver in [`FrameState::Failed`].
    pub fn run_frame(&mut self, window: &mut impl WindowSurface) -> PresentResult<FrameOutcome> {
        match self.state {
            FrameState::Idle => {}
            FrameState::Shutdown => return Err(PresentError::invalid("frame driver is shut down")),
            FrameState::Failed => return Err(PresentError::invalid("a previous frame failed")),
            state => return Err(PresentError::invalid(format!("frame driver is mid-frame ({state:?})"))),
        }

        let result = self.next_frame(window);
        if let Err(e) = &result {
            log::error!("Frame {} failed while {:?}: {}", self.frames_presented, self.state, e);
            self.state = FrameState::Failed;
        }
        result
    }

    /// Run frames until the window closes; returns the number presented
    pub fn run(&mut self, window: &mut impl WindowSurface) -> PresentResult<u64> {
        loop {
            if self.run_frame(window)? == FrameOutcome::Closed {
                log::info!("Window closed after {} frames", self.frames_presented);
                return Ok(self.frames_presented);
            }
        }
    }

    /// Idle the device ahead of teardown
    pub fn shutdown(&mut self) -> PresentResult<()> {
        self.device.wait_idle()?;
        self.state = FrameState::Shutdown;
        log::debug!("Frame driver shut down");
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Manager of the live chain generation
    pub fn swapchain(&self) -> &SwapchainManager<D> {
        &self.swapchain
    }

    /// Frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Pacing policy
    pub fn pacing(&self) -> FramePacing {
        self.pacing
    }

    /// The draw workload
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    fn next_frame(&mut self, window: &mut impl WindowSurface) -> PresentResult<FrameOutcome> {
        let mut suspended = false;

        for attempt in 0..ACQUIRE_ATTEMPTS {
            window.poll_events();
            if window.should_close() {
                return Ok(FrameOutcome::Closed);
            }
            if attempt > 0 {
                log::warn!("Swap buffer chain out of date at acquire, recreating");
                self.stale = true;
            }

            let Some(extent) = wait_for_surface(self.device.as_ref(), window, &mut suspended)? else {
                return Ok(FrameOutcome::Closed);
            };
            if let Some(report) = self.present_frame(extent, suspended)? {
                return Ok(FrameOutcome::Presented(report));
            }
        }

        Err(PresentError::SurfaceLost)
    }

    /// Present one frame at `extent`; `None` when the chain was out of date at acquire
    fn present_frame(&mut self, extent: Extent2D, suspended: bool) -> PresentResult<Option<FrameReport>> {
        let recreated = if self.stale {
            self.swapchain.recreate(extent)?;
            true
        } else {
            self.swapchain.reconcile(extent)? == ReconcileOutcome::Recreated
        };
        self.stale = false;

        let slot_index = self.current_slot;
        if let Some(fence) = &self.slots[slot_index].in_flight {
            fence.wait(u64::MAX)?;
        }

        self.state = FrameState::Acquiring;
        let acquired = match self.acquire(slot_index) {
            Ok(acquired) => acquired,
            Err(PresentError::OutOfDateFrame) => {
                self.state = FrameState::Idle;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if acquired.suboptimal {
            log::debug!("Suboptimal acquire, chain will be recreated next frame");
            self.stale = true;
        }

        let wait = self.slots[slot_index].sync.acquire_signal();
        let signal = self.release_signal(slot_index, acquired.index)?;
        let slot = &self.slots[slot_index];
        let fence = slot.in_flight.as_ref().map(Fence::handle);
        if let Some(fence) = &slot.in_flight {
            fence.reset()?;
        }

        self.state = FrameState::Recording;
        let command_buffer = self.record(slot_index, acquired.index)?;

        self.state = FrameState::Submitted;
        self.device.queue_submit(&SubmitInfo {
            command_buffer,
            wait,
            signal,
            fence,
        })?;

        self.state = FrameState::Presenting;
        match self
            .device
            .queue_present(self.swapchain.live().handle(), acquired.index, signal)
        {
            Ok(PresentStatus::Optimal) => {}
            Ok(PresentStatus::Suboptimal) => {
                log::debug!("Suboptimal present, chain will be recreated next frame");
                self.stale = true;
            }
            Err(PresentError::OutOfDateFrame) => {
                log::debug!("Swap buffer chain out of date at present, chain will be recreated next frame");
                self.stale = true;
            }
            Err(e) => return Err(e),
        }

        if self.pacing == FramePacing::Blocking {
            self.device.wait_idle()?;
        }

        self.current_slot = (slot_index + 1) % self.slots.len();
        self.frames_presented += 1;
        self.state = FrameState::Idle;

        Ok(Some(FrameReport {
            image_index: acquired.index,
            generation: self.swapchain.live().generation(),
            extent,
            recreated,
            suspended,
        }))
    }

    fn acquire(&self, slot_index: usize) -> PresentResult<AcquiredImage> {
        self.device.acquire_next_image(
            self.swapchain.live().handle(),
            u64::MAX,
            self.slots[slot_index].sync.acquire_signal(),
        )
    }

    /// Semaphore the submission signals and presentation waits on
    ///
    /// Presentation holds it until its image is acquired again, which a slot
    /// fence does not cover, so pipelined frames signal one per chain image.
    fn release_signal(&mut self, slot_index: usize, image_index: u32) -> PresentResult<D::Semaphore> {
        if self.pacing == FramePacing::Blocking {
            return Ok(self.slots[slot_index].sync.release_signal());
        }

        let index = image_index as usize;
        while self.image_release.len() <= index {
            self.image_release.push(Semaphore::new(Arc::clone(&self.device))?);
        }
        Ok(self.image_release[index].handle())
    }

    fn record(&mut self, slot_index: usize, image_index: u32) -> PresentResult<D::CommandBuffer> {
        let target = self.swapchain.live().target(image_index)?;
        let mut recorder = self.slots[slot_index].commands.begin()?;
        {
            let mut pass = recorder.begin_render_pass(self.render_pass, target, self.clear_color)?;
            pass.set_viewport();
            pass.set_scissor();
            self.recorder.record(&mut pass)?;
        }
        recorder.end()
    }
}

impl<D: PresentationDevice, R: FrameRecorder<D>> Drop for FrameDriver<D, R> {
    fn drop(&mut self) {
        if self.state != FrameState::Shutdown {
            if let Err(e) = self.device.wait_idle() {
                log::error!("Failed to idle device before teardown: {}", e);
            }
        }
        log::debug!("Dropping frame driver after {} frames", self.frames_presented);
    }
}
