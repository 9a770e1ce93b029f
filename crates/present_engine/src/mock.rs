//! Recording device and window used by the unit tests
//!
//! [`MockDevice`] implements [`PresentationDevice`] over plain `u64` handles. It
//! logs every call as a [`MockEvent`], can be scripted to fail in the ways a
//! real surface fails, and checks the usage rules a validation layer would:
//! semaphore signal/wait pairing, semaphores re-signalled while presentation
//! still holds them, objects destroyed while the GPU may still use them, and
//! child objects outliving their parents.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::device::{
    AcquiredImage, ClearColor, Extent2D, PresentMode, PresentStatus, PresentationDevice, SubmitInfo,
    SurfaceCapabilities, SwapchainCreateInfo,
};
use crate::error::{PresentError, PresentResult};
use crate::swapchain::ChainDesc;
use crate::window::WindowSurface;

/// Render pass handle tests build targets against
pub const MOCK_RENDER_PASS: u64 = 1;

/// Surface format reported by the mock
pub const MOCK_FORMAT: u32 = 50;

/// One recorded device call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    CreateSwapchain {
        id: u64,
        extent: Extent2D,
        image_count: u32,
        previous: Option<u64>,
    },
    DestroySwapchain(u64),
    CreateImageView(u64),
    DestroyImageView(u64),
    CreateFramebuffer(u64),
    DestroyFramebuffer(u64),
    CreateSemaphore(u64),
    DestroySemaphore(u64),
    CreateFence(u64),
    WaitFence(u64),
    ResetFence(u64),
    DestroyFence(u64),
    CreateCommandPool(u64),
    ResetCommandPool(u64),
    DestroyCommandPool(u64),
    BeginCommandBuffer(u64),
    EndCommandBuffer(u64),
    BeginRenderPass { framebuffer: u64, extent: Extent2D },
    EndRenderPass,
    SetViewport(Extent2D),
    SetScissor(Extent2D),
    Acquire {
        swapchain: u64,
        image_index: u32,
        signal: u64,
    },
    Submit {
        wait: u64,
        signal: u64,
        fence: Option<u64>,
    },
    Present {
        swapchain: u64,
        image_index: u32,
        wait: u64,
    },
    WaitIdle,
}

struct MockSwapchain {
    images: Vec<u64>,
    held: HashSet<u32>,
    next: u32,
    retired: bool,
}

#[derive(Default)]
struct MockCommandBuffer {
    pool: u64,
    recording: bool,
    in_render_pass: bool,
}

struct PendingSubmit {
    command_buffer: u64,
    fence: Option<u64>,
}

struct MockState {
    next_handle: u64,
    events: Vec<MockEvent>,
    violations: Vec<String>,
    teardown_violations: Vec<String>,

    capabilities_available: bool,
    surface_extent: Option<Extent2D>,
    platform_image_count: Option<u32>,
    image_views_until_failure: Option<usize>,
    out_of_date_acquires: u32,
    suboptimal_acquires: u32,
    out_of_date_presents: u32,
    suboptimal_presents: u32,
    surface_lost: bool,

    swapchains: HashMap<u64, MockSwapchain>,
    image_owner: HashMap<u64, u64>,
    views: HashMap<u64, u64>,
    framebuffers: HashMap<u64, (u64, Extent2D)>,
    semaphores: HashMap<u64, bool>,
    fences: HashMap<u64, bool>,
    pools: HashSet<u64>,
    command_buffers: HashMap<u64, MockCommandBuffer>,
    pending: VecDeque<PendingSubmit>,
    // Present wait semaphores, held until their image is acquired again.
    presenting: HashMap<u64, (u64, u32)>,
}

impl MockState {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn violation(&mut self, message: String) {
        self.violations.push(message);
    }

    fn check_idle(&mut self, what: &str, handle: u64) {
        if !self.pending.is_empty() {
            self.violation(format!("{what} {handle} destroyed while GPU work is pending"));
        }
    }

    fn complete_through(&mut self, position: usize) {
        for submit in self.pending.drain(..=position) {
            if let Some(fence) = submit.fence {
                self.fences.insert(fence, true);
            }
        }
    }

    fn recording(&mut self, command_buffer: u64, call: &str) {
        let ok = self.command_buffers.get(&command_buffer).is_some_and(|cb| cb.recording);
        if !ok {
            self.violation(format!("{call} on command buffer {command_buffer} outside recording"));
        }
    }
}

/// Recording [`PresentationDevice`] with scriptable surface behaviour
pub struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_handle: 100,
                events: Vec::new(),
                violations: Vec::new(),
                teardown_violations: Vec::new(),
                capabilities_available: true,
                surface_extent: None,
                platform_image_count: None,
                image_views_until_failure: None,
                out_of_date_acquires: 0,
                suboptimal_acquires: 0,
                out_of_date_presents: 0,
                suboptimal_presents: 0,
                surface_lost: false,
                swapchains: HashMap::new(),
                image_owner: HashMap::new(),
                views: HashMap::new(),
                framebuffers: HashMap::new(),
                semaphores: HashMap::new(),
                fences: HashMap::new(),
                pools: HashSet::new(),
                command_buffers: HashMap::new(),
                pending: VecDeque::new(),
                presenting: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Chain description matching this device
    pub fn chain_desc(&self, min_image_count: u32) -> ChainDesc<Self> {
        ChainDesc {
            queue_family: 0,
            format: MOCK_FORMAT,
            render_pass: MOCK_RENDER_PASS,
            present_mode: PresentMode::Fifo,
            min_image_count,
        }
    }

    pub fn set_capabilities_available(&self, available: bool) {
        self.state().capabilities_available = available;
    }

    /// Report a fixed current extent in the surface capabilities
    pub fn set_surface_extent(&self, extent: Option<Extent2D>) {
        self.state().surface_extent = extent;
    }

    /// Override how many images the platform hands out per chain
    pub fn set_platform_image_count(&self, count: Option<u32>) {
        self.state().platform_image_count = count;
    }

    /// Let `count` image views succeed, then fail allocation
    pub fn fail_image_view_after(&self, count: usize) {
        self.state().image_views_until_failure = Some(count);
    }

    pub fn script_out_of_date_acquires(&self, count: u32) {
        self.state().out_of_date_acquires = count;
    }

    pub fn script_suboptimal_acquires(&self, count: u32) {
        self.state().suboptimal_acquires = count;
    }

    pub fn script_out_of_date_presents(&self, count: u32) {
        self.state().out_of_date_presents = count;
    }

    pub fn script_suboptimal_presents(&self, count: u32) {
        self.state().suboptimal_presents = count;
    }

    pub fn lose_surface(&self) {
        self.state().surface_lost = true;
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    pub fn count(&self, predicate: impl Fn(&MockEvent) -> bool) -> usize {
        self.state().events.iter().filter(|e| predicate(e)).count()
    }

    /// Usage-rule violations seen so far
    pub fn violations(&self) -> Vec<String> {
        self.state().violations.clone()
    }

    /// Children destroyed after their parents
    pub fn teardown_order_violations(&self) -> Vec<String> {
        self.state().teardown_violations.clone()
    }

    pub fn fence_signaled(&self, fence: u64) -> bool {
        self.state().fences.get(&fence).copied().unwrap_or(false)
    }

    pub fn live_swapchains(&self) -> usize {
        self.state().swapchains.len()
    }

    pub fn live_image_views(&self) -> usize {
        self.state().views.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state().framebuffers.len()
    }

    pub fn live_semaphores(&self) -> usize {
        self.state().semaphores.len()
    }

    pub fn live_fences(&self) -> usize {
        self.state().fences.len()
    }

    pub fn live_command_pools(&self) -> usize {
        self.state().pools.len()
    }

    /// Number of live objects of every kind
    pub fn live_objects(&self) -> usize {
        let state = self.state();
        state.swapchains.len()
            + state.views.len()
            + state.framebuffers.len()
            + state.semaphores.len()
            + state.fences.len()
            + state.pools.len()
    }
}

impl PresentationDevice for MockDevice {
    type Format = u32;
    type Swapchain = u64;
    type Image = u64;
    type ImageView = u64;
    type Framebuffer = u64;
    type RenderPass = u64;
    type Semaphore = u64;
    type Fence = u64;
    type CommandPool = u64;
    type CommandBuffer = u64;

    fn surface_capabilities(&self) -> PresentResult<SurfaceCapabilities> {
        let state = self.state();
        if !state.capabilities_available {
            return Err(PresentError::PresentationUnavailable("no surface capabilities".into()));
        }
        Ok(SurfaceCapabilities {
            current_extent: state.surface_extent,
            min_image_extent: Extent2D::new(1, 1),
            max_image_extent: Extent2D::new(16384, 16384),
            min_image_count: 2,
            max_image_count: 8,
        })
    }

    fn surface_format(&self) -> PresentResult<u32> {
        Ok(MOCK_FORMAT)
    }

    fn create_swapchain(&self, info: &SwapchainCreateInfo<Self>) -> PresentResult<u64> {
        let mut state = self.state();
        if state.surface_lost {
            return Err(PresentError::SurfaceLost);
        }
        let id = state.handle();
        let image_count = state.platform_image_count.unwrap_or(info.image_count);
        let images: Vec<u64> = (0..image_count).map(|_| state.handle()).collect();
        for &image in &images {
            state.image_owner.insert(image, id);
        }
        if let Some(previous) = info.previous {
            match state.swapchains.get_mut(&previous) {
                Some(old) => old.retired = true,
                None => state.violation(format!("previous chain {previous} is not live")),
            }
        }
        state.swapchains.insert(
            id,
            MockSwapchain {
                images,
                held: HashSet::new(),
                next: 0,
                retired: false,
            },
        );
        state.events.push(MockEvent::CreateSwapchain {
            id,
            extent: info.extent,
            image_count,
            previous: info.previous,
        });
        Ok(id)
    }

    fn swapchain_images(&self, swapchain: u64) -> PresentResult<Vec<u64>> {
        self.state()
            .swapchains
            .get(&swapchain)
            .map(|chain| chain.images.clone())
            .ok_or_else(|| PresentError::invalid(format!("unknown chain {swapchain}")))
    }

    fn destroy_swapchain(&self, swapchain: u64) {
        let mut state = self.state();
        state.check_idle("swapchain", swapchain);
        let Some(chain) = state.swapchains.remove(&swapchain) else {
            state.violation(format!("double destroy of chain {swapchain}"));
            return;
        };
        let orphaned = state.views.values().filter(|image| chain.images.contains(*image)).count();
        if orphaned > 0 {
            state
                .teardown_violations
                .push(format!("chain {swapchain} destroyed with {orphaned} live image views"));
        }
        for image in &chain.images {
            state.image_owner.remove(image);
        }
        state.presenting.retain(|_, held| held.0 != swapchain);
        state.events.push(MockEvent::DestroySwapchain(swapchain));
    }

    fn create_image_view(&self, image: u64, _format: u32) -> PresentResult<u64> {
        let mut state = self.state();
        if let Some(remaining) = state.image_views_until_failure {
            if remaining == 0 {
                return Err(PresentError::allocation("image view"));
            }
            state.image_views_until_failure = Some(remaining - 1);
        }
        let view = state.handle();
        state.views.insert(view, image);
        state.events.push(MockEvent::CreateImageView(view));
        Ok(view)
    }

    fn destroy_image_view(&self, view: u64) {
        let mut state = self.state();
        state.check_idle("image view", view);
        if state.views.remove(&view).is_none() {
            state.violation(format!("double destroy of image view {view}"));
        }
        if state.framebuffers.values().any(|(v, _)| *v == view) {
            state
                .teardown_violations
                .push(format!("image view {view} destroyed while a framebuffer uses it"));
        }
        state.events.push(MockEvent::DestroyImageView(view));
    }

    fn create_framebuffer(&self, _render_pass: u64, view: u64, extent: Extent2D) -> PresentResult<u64> {
        let mut state = self.state();
        let framebuffer = state.handle();
        state.framebuffers.insert(framebuffer, (view, extent));
        state.events.push(MockEvent::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&self, framebuffer: u64) {
        let mut state = self.state();
        state.check_idle("framebuffer", framebuffer);
        if state.framebuffers.remove(&framebuffer).is_none() {
            state.violation(format!("double destroy of framebuffer {framebuffer}"));
        }
        state.events.push(MockEvent::DestroyFramebuffer(framebuffer));
    }

    fn create_semaphore(&self) -> PresentResult<u64> {
        let mut state = self.state();
        let semaphore = state.handle();
        state.semaphores.insert(semaphore, false);
        state.events.push(MockEvent::CreateSemaphore(semaphore));
        Ok(semaphore)
    }

    fn destroy_semaphore(&self, semaphore: u64) {
        let mut state = self.state();
        state.check_idle("semaphore", semaphore);
        if state.semaphores.remove(&semaphore).is_none() {
            state.violation(format!("double destroy of semaphore {semaphore}"));
        }
        state.presenting.remove(&semaphore);
        state.events.push(MockEvent::DestroySemaphore(semaphore));
    }

    fn create_fence(&self, signaled: bool) -> PresentResult<u64> {
        let mut state = self.state();
        let fence = state.handle();
        state.fences.insert(fence, signaled);
        state.events.push(MockEvent::CreateFence(fence));
        Ok(fence)
    }

    fn wait_for_fence(&self, fence: u64, _timeout: u64) -> PresentResult<()> {
        let mut state = self.state();
        state.events.push(MockEvent::WaitFence(fence));
        if state.fences.get(&fence).copied().unwrap_or(false) {
            return Ok(());
        }
        match state.pending.iter().position(|s| s.fence == Some(fence)) {
            Some(position) => {
                state.complete_through(position);
                Ok(())
            }
            None => {
                state.violation(format!("wait on fence {fence} that nothing will signal"));
                Err(PresentError::Backend {
                    operation: "vkWaitForFences",
                    code: "TIMEOUT".into(),
                })
            }
        }
    }

    fn reset_fence(&self, fence: u64) -> PresentResult<()> {
        let mut state = self.state();
        if state.pending.iter().any(|s| s.fence == Some(fence)) {
            state.violation(format!("reset of fence {fence} still pending"));
        }
        state.fences.insert(fence, false);
        state.events.push(MockEvent::ResetFence(fence));
        Ok(())
    }

    fn destroy_fence(&self, fence: u64) {
        let mut state = self.state();
        state.check_idle("fence", fence);
        state.fences.remove(&fence);
        state.events.push(MockEvent::DestroyFence(fence));
    }

    fn create_command_pool(&self, _queue_family: u32) -> PresentResult<u64> {
        let mut state = self.state();
        let pool = state.handle();
        state.pools.insert(pool);
        state.events.push(MockEvent::CreateCommandPool(pool));
        Ok(pool)
    }

    fn allocate_command_buffer(&self, pool: u64) -> PresentResult<u64> {
        let mut state = self.state();
        let command_buffer = state.handle();
        state.command_buffers.insert(
            command_buffer,
            MockCommandBuffer {
                pool,
                ..MockCommandBuffer::default()
            },
        );
        Ok(command_buffer)
    }

    fn reset_command_pool(&self, pool: u64) -> PresentResult<()> {
        let mut state = self.state();
        let in_use = state
            .pending
            .iter()
            .any(|s| state.command_buffers.get(&s.command_buffer).is_some_and(|cb| cb.pool == pool));
        if in_use {
            state.violation(format!("command pool {pool} reset while its commands are pending"));
        }
        for cb in state.command_buffers.values_mut().filter(|cb| cb.pool == pool) {
            cb.recording = false;
            cb.in_render_pass = false;
        }
        state.events.push(MockEvent::ResetCommandPool(pool));
        Ok(())
    }

    fn destroy_command_pool(&self, pool: u64) {
        let mut state = self.state();
        state.check_idle("command pool", pool);
        state.pools.remove(&pool);
        state.command_buffers.retain(|_, cb| cb.pool != pool);
        state.events.push(MockEvent::DestroyCommandPool(pool));
    }

    fn begin_command_buffer(&self, command_buffer: u64) -> PresentResult<()> {
        let mut state = self.state();
        let already = state.command_buffers.get(&command_buffer).map(|cb| cb.recording);
        match already {
            Some(false) => {
                if let Some(cb) = state.command_buffers.get_mut(&command_buffer) {
                    cb.recording = true;
                }
            }
            Some(true) => state.violation(format!("command buffer {command_buffer} begun twice")),
            None => state.violation(format!("unknown command buffer {command_buffer}")),
        }
        state.events.push(MockEvent::BeginCommandBuffer(command_buffer));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: u64) -> PresentResult<()> {
        let mut state = self.state();
        state.recording(command_buffer, "end");
        let inside_pass = state.command_buffers.get(&command_buffer).is_some_and(|cb| cb.in_render_pass);
        if inside_pass {
            state.violation(format!("command buffer {command_buffer} ended inside a render pass"));
        }
        if let Some(cb) = state.command_buffers.get_mut(&command_buffer) {
            cb.recording = false;
        }
        state.events.push(MockEvent::EndCommandBuffer(command_buffer));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: u64,
        _render_pass: u64,
        framebuffer: u64,
        extent: Extent2D,
        _clear_color: ClearColor,
    ) {
        let mut state = self.state();
        state.recording(command_buffer, "begin render pass");
        match state.framebuffers.get(&framebuffer).map(|(_, e)| *e) {
            Some(fb_extent) if fb_extent != extent => {
                state.violation(format!("render area {extent} does not match framebuffer {fb_extent}"));
            }
            None => state.violation(format!("render pass on dead framebuffer {framebuffer}")),
            Some(_) => {}
        }
        if let Some(cb) = state.command_buffers.get_mut(&command_buffer) {
            cb.in_render_pass = true;
        }
        state.events.push(MockEvent::BeginRenderPass { framebuffer, extent });
    }

    fn cmd_end_render_pass(&self, command_buffer: u64) {
        let mut state = self.state();
        let inside_pass = state.command_buffers.get(&command_buffer).is_some_and(|cb| cb.in_render_pass);
        if !inside_pass {
            state.violation(format!("end render pass without begin on {command_buffer}"));
        }
        if let Some(cb) = state.command_buffers.get_mut(&command_buffer) {
            cb.in_render_pass = false;
        }
        state.events.push(MockEvent::EndRenderPass);
    }

    fn cmd_set_viewport(&self, command_buffer: u64, extent: Extent2D) {
        let mut state = self.state();
        state.recording(command_buffer, "set viewport");
        state.events.push(MockEvent::SetViewport(extent));
    }

    fn cmd_set_scissor(&self, command_buffer: u64, extent: Extent2D) {
        let mut state = self.state();
        state.recording(command_buffer, "set scissor");
        state.events.push(MockEvent::SetScissor(extent));
    }

    fn acquire_next_image(&self, swapchain: u64, _timeout: u64, signal: u64) -> PresentResult<AcquiredImage> {
        let mut state = self.state();
        if state.surface_lost {
            return Err(PresentError::SurfaceLost);
        }
        if state.out_of_date_acquires > 0 {
            state.out_of_date_acquires -= 1;
            return Err(PresentError::OutOfDateFrame);
        }
        let Some(chain) = state.swapchains.get_mut(&swapchain) else {
            state.violation(format!("acquire from dead chain {swapchain}"));
            return Err(PresentError::OutOfDateFrame);
        };
        if chain.retired {
            state.violation(format!("acquire from retired chain {swapchain}"));
            return Err(PresentError::OutOfDateFrame);
        }

        let count = chain.images.len() as u32;
        let free = (0..count).map(|i| (chain.next + i) % count).find(|i| !chain.held.contains(i));
        let Some(image_index) = free else {
            state.violation(format!("every image of chain {swapchain} is already held"));
            return Err(PresentError::Backend {
                operation: "vkAcquireNextImageKHR",
                code: "NOT_READY".into(),
            });
        };
        chain.held.insert(image_index);
        chain.next = (image_index + 1) % count;
        state.presenting.retain(|_, held| *held != (swapchain, image_index));

        match state.semaphores.get(&signal).copied() {
            Some(true) => state.violation(format!("acquire signals semaphore {signal} that is already signalled")),
            Some(false) => {
                state.semaphores.insert(signal, true);
            }
            None => state.violation(format!("acquire signals dead semaphore {signal}")),
        }

        let suboptimal = state.suboptimal_acquires > 0;
        if suboptimal {
            state.suboptimal_acquires -= 1;
        }
        state.events.push(MockEvent::Acquire {
            swapchain,
            image_index,
            signal,
        });
        Ok(AcquiredImage {
            index: image_index,
            suboptimal,
        })
    }

    fn queue_submit(&self, info: &SubmitInfo<Self>) -> PresentResult<()> {
        let mut state = self.state();
        let still_recording = state.command_buffers.get(&info.command_buffer).map(|cb| cb.recording);
        match still_recording {
            Some(true) => state.violation(format!("submit of command buffer {} still recording", info.command_buffer)),
            None => state.violation(format!("submit of dead command buffer {}", info.command_buffer)),
            Some(false) => {}
        }

        if state.semaphores.get(&info.wait).copied() == Some(true) {
            state.semaphores.insert(info.wait, false);
        } else {
            state.violation(format!("submit waits on unsignalled semaphore {}", info.wait));
        }
        if state.presenting.contains_key(&info.signal) {
            state.violation(format!(
                "submit signals semaphore {} still held by presentation",
                info.signal
            ));
        }
        if state.semaphores.get(&info.signal).copied() == Some(false) {
            state.semaphores.insert(info.signal, true);
        } else {
            state.violation(format!("submit signals semaphore {} that is not idle", info.signal));
        }
        if let Some(fence) = info.fence {
            if state.fences.get(&fence).copied() != Some(false) {
                state.violation(format!("submit with fence {fence} that is not reset"));
            }
        }

        state.pending.push_back(PendingSubmit {
            command_buffer: info.command_buffer,
            fence: info.fence,
        });
        state.events.push(MockEvent::Submit {
            wait: info.wait,
            signal: info.signal,
            fence: info.fence,
        });
        Ok(())
    }

    fn queue_present(&self, swapchain: u64, image_index: u32, wait: u64) -> PresentResult<PresentStatus> {
        let mut state = self.state();
        if state.surface_lost {
            return Err(PresentError::SurfaceLost);
        }

        // The wait executes even when the request is rejected as out of date.
        if state.semaphores.get(&wait).copied() == Some(true) {
            state.semaphores.insert(wait, false);
            state.presenting.insert(wait, (swapchain, image_index));
        } else {
            state.violation(format!("present waits on unsignalled semaphore {wait}"));
        }
        let released = state
            .swapchains
            .get_mut(&swapchain)
            .is_some_and(|chain| chain.held.remove(&image_index));
        if !released {
            state.violation(format!("present of image {image_index} not held from chain {swapchain}"));
        }
        state.events.push(MockEvent::Present {
            swapchain,
            image_index,
            wait,
        });

        if state.out_of_date_presents > 0 {
            state.out_of_date_presents -= 1;
            return Err(PresentError::OutOfDateFrame);
        }
        if state.suboptimal_presents > 0 {
            state.suboptimal_presents -= 1;
            return Ok(PresentStatus::Suboptimal);
        }
        Ok(PresentStatus::Optimal)
    }

    fn wait_idle(&self) -> PresentResult<()> {
        let mut state = self.state();
        if !state.pending.is_empty() {
            let last = state.pending.len() - 1;
            state.complete_through(last);
        }
        state.presenting.clear();
        state.events.push(MockEvent::WaitIdle);
        Ok(())
    }
}

/// Window whose size follows a script, one step per event poll or wait
pub struct MockWindow {
    extent: Extent2D,
    script: VecDeque<Extent2D>,
    close_after_polls: Option<usize>,
    closed: bool,
    pub polls: usize,
    pub waits: usize,
}

impl MockWindow {
    pub fn new(extent: Extent2D) -> Self {
        Self {
            extent,
            script: VecDeque::new(),
            close_after_polls: None,
            closed: false,
            polls: 0,
            waits: 0,
        }
    }

    /// Queue extents the window takes on successive polls or waits
    pub fn with_script(mut self, script: impl IntoIterator<Item = Extent2D>) -> Self {
        self.script.extend(script);
        self
    }

    /// Request close once this many polls have happened
    pub fn close_after(mut self, polls: usize) -> Self {
        self.close_after_polls = Some(polls);
        self
    }

    pub fn resize(&mut self, extent: Extent2D) {
        self.extent = extent;
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    fn step(&mut self) {
        if let Some(extent) = self.script.pop_front() {
            self.extent = extent;
        }
    }
}

impl WindowSurface for MockWindow {
    fn poll_events(&mut self) {
        self.polls += 1;
        self.step();
        if self.close_after_polls.is_some_and(|n| self.polls > n) {
            self.closed = true;
        }
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        if self.script.is_empty() && self.extent.is_zero_area() {
            // Nothing will ever restore the window; end the run instead of spinning.
            self.closed = true;
        }
        self.step();
    }

    fn current_extent(&self) -> Extent2D {
        self.extent
    }

    fn should_close(&self) -> bool {
        self.closed
    }
}
