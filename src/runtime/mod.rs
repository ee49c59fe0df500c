//! Single-threaded event loop driving a [`Viewer`].
//!
//! Viewport events and bus commands arrive on two `calloop` channels. Futures
//! returned by draw-mode requests run on a local pool owned by the loop, so a
//! session's resolution handler runs on the same turn as its shape event,
//! after the `annotationCreated` publish. Layers of resolved sessions are
//! deleted from an idle callback once that turn is over (or on the viewport's
//! next draw pass, depending on [`RetireOn`](crate::config::RetireOn)).

use crate::bus::{BusCommand, EventSink};
use crate::draw_mode::DrawError;
use crate::viewer::{Viewer, ViewerError};
use crate::viewport::{ViewportBackend, ViewportEvent};
use calloop::channel::{self, Channel, Sender};
use calloop::{EventLoop, LoopHandle};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

/// Everything the loop callbacks mutate.
pub struct ViewerHost<B: ViewportBackend, S: EventSink> {
    pub viewer: Viewer<B, S>,
    pool: LocalPool,
    retire_scheduled: bool,
    should_exit: bool,
}

impl<B: ViewportBackend, S: EventSink> ViewerHost<B, S> {
    fn new(viewer: Viewer<B, S>) -> Self {
        Self {
            viewer,
            pool: LocalPool::new(),
            retire_scheduled: false,
            should_exit: false,
        }
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    fn spawn<F>(&self, future: F) -> Result<(), ViewerError>
    where
        F: Future<Output = ()> + 'static,
    {
        self.pool
            .spawner()
            .spawn_local(future)
            .map_err(|e| ViewerError::Spawn(e.to_string()))
    }

    fn handle_command(&mut self, command: BusCommand) {
        debug!("Bus command: {:?}", command);
        match command {
            BusCommand::Render => {
                if let Err(err) = self.viewer.render() {
                    warn!("Render failed: {}", err);
                }
            }
            BusCommand::StartDrawMode { shape, options } => {
                match self.viewer.start_draw_mode(shape, options) {
                    Ok(request) => {
                        let spawned = self.spawn(async move {
                            match request.await {
                                Ok(outcome) => debug!(
                                    "{} session resolved with element {}",
                                    shape,
                                    outcome.element.id.as_deref().unwrap_or_default()
                                ),
                                Err(err) => log_draw_failure(&err),
                            }
                        });
                        if let Err(err) = spawned {
                            warn!("{}", err);
                        }
                    }
                    Err(err) => warn!("Cannot start {} draw mode: {}", shape, err),
                }
            }
            BusCommand::DrawRegion { model } => match self.viewer.draw_region(model) {
                Ok(request) => {
                    let spawned = self.spawn(async move {
                        match request.await {
                            Ok(region) => debug!("Region drawn: {:?}", region.to_array()),
                            Err(err) => log_draw_failure(&err),
                        }
                    });
                    if let Err(err) = spawned {
                        warn!("{}", err);
                    }
                }
                Err(err) => warn!("Cannot draw region: {}", err),
            },
            BusCommand::CancelDraw => {
                if !self.viewer.cancel_draw() {
                    debug!("No draw session to cancel");
                }
            }
            BusCommand::Shutdown => {
                info!("Shutdown requested");
                self.viewer.destroy();
                self.should_exit = true;
            }
        }
        self.pool.run_until_stalled();
    }
}

fn log_draw_failure(err: &DrawError) {
    match err {
        DrawError::Cancelled | DrawError::Abandoned => debug!("Draw session ended: {}", err),
        other => warn!("Draw session failed: {}", other),
    }
}

/// Owns the event loop, the host state and the senders feeding it.
pub struct ViewerLoop<B, S>
where
    B: ViewportBackend + 'static,
    S: EventSink + 'static,
{
    event_loop: EventLoop<'static, ViewerHost<B, S>>,
    host: ViewerHost<B, S>,
    viewport_events: Sender<ViewportEvent>,
    commands: Sender<BusCommand>,
}

impl<B, S> ViewerLoop<B, S>
where
    B: ViewportBackend + 'static,
    S: EventSink + 'static,
{
    pub fn new(viewer: Viewer<B, S>) -> Result<Self, ViewerError> {
        let event_loop: EventLoop<'static, ViewerHost<B, S>> =
            EventLoop::try_new().map_err(|e| ViewerError::EventLoop(e.to_string()))?;
        let handle = event_loop.handle();

        let (viewport_events, viewport_channel) = channel::channel::<ViewportEvent>();
        let (commands, command_channel) = channel::channel::<BusCommand>();
        register_viewport_events(&handle, viewport_channel)?;
        register_commands(&handle, command_channel)?;

        Ok(Self {
            event_loop,
            host: ViewerHost::new(viewer),
            viewport_events,
            commands,
        })
    }

    /// Sender for the viewport library's event callbacks.
    pub fn viewport_events(&self) -> Sender<ViewportEvent> {
        self.viewport_events.clone()
    }

    /// Sender for host-application commands.
    pub fn commands(&self) -> Sender<BusCommand> {
        self.commands.clone()
    }

    /// Runs `future` on the loop's local pool.
    pub fn spawn_local<F>(&self, future: F) -> Result<(), ViewerError>
    where
        F: Future<Output = ()> + 'static,
    {
        self.host.spawn(future)
    }

    /// Processes pending events once, waiting at most `timeout`.
    pub fn dispatch(&mut self, timeout: Option<Duration>) -> Result<(), ViewerError> {
        self.event_loop
            .dispatch(timeout, &mut self.host)
            .map_err(|e| ViewerError::EventLoop(e.to_string()))?;
        self.host.pool.run_until_stalled();
        Ok(())
    }

    /// Dispatches until a shutdown command has been handled.
    pub fn run(&mut self) -> Result<(), ViewerError> {
        loop {
            if self.host.should_exit {
                info!("Exit requested, breaking event loop");
                break;
            }
            self.dispatch(None)?;
        }
        Ok(())
    }

    pub fn host(&self) -> &ViewerHost<B, S> {
        &self.host
    }

    pub fn viewer(&self) -> &Viewer<B, S> {
        &self.host.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer<B, S> {
        &mut self.host.viewer
    }
}

fn register_viewport_events<B, S>(
    handle: &LoopHandle<'static, ViewerHost<B, S>>,
    source: Channel<ViewportEvent>,
) -> Result<(), ViewerError>
where
    B: ViewportBackend + 'static,
    S: EventSink + 'static,
{
    let idle_handle = handle.clone();
    handle
        .insert_source(source, move |event, _, host: &mut ViewerHost<B, S>| {
            let channel::Event::Msg(event) = event else {
                debug!("Viewport event channel closed");
                return;
            };
            let retire = host.viewer.handle_viewport_event(event);
            host.pool.run_until_stalled();
            if retire && !host.retire_scheduled {
                host.retire_scheduled = true;
                idle_handle.insert_idle(|host: &mut ViewerHost<B, S>| {
                    host.retire_scheduled = false;
                    let retired = host.viewer.retire_draw_sessions();
                    debug!("Retired {} draw layers", retired);
                });
            }
        })
        .map_err(|e| ViewerError::EventLoop(e.error.to_string()))?;
    Ok(())
}

fn register_commands<B, S>(
    handle: &LoopHandle<'static, ViewerHost<B, S>>,
    source: Channel<BusCommand>,
) -> Result<(), ViewerError>
where
    B: ViewportBackend + 'static,
    S: EventSink + 'static,
{
    handle
        .insert_source(source, |event, _, host: &mut ViewerHost<B, S>| match event {
            channel::Event::Msg(command) => host.handle_command(command),
            channel::Event::Closed => {
                info!("Command channel closed");
                host.should_exit = true;
            }
        })
        .map_err(|e| ViewerError::EventLoop(e.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests;
