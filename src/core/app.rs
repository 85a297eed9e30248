use std::sync::Arc;

use cosmic::iced::{Limits, window};
use cosmic::iced_core::event::wayland::OutputEvent;
use cosmic::iced_runtime::clipboard;
use cosmic::iced_runtime::platform_specific::wayland::layer_surface::{
    IcedOutput, SctkLayerSurfaceSettings,
};
use cosmic::iced_winit::commands::layer_surface::{destroy_layer_surface, get_layer_surface};
use cosmic::widget::horizontal_space;
use cosmic::{
    app,
    iced_futures::{Subscription, event::listen_with},
};
use cosmic_client_toolkit::sctk::shell::wlr_layer::{Anchor, KeyboardInteractivity, Layer};
use image::RgbaImage;
use wayland_client::protocol::wl_output::WlOutput;

use crate::capture::{ScreenSnapshot, capture_snapshot, crop_logical};
use crate::config::SessionConfig;
use crate::domain::{Selection, SelectionEvent, Transition};
use crate::ocr::TesseractRecognizer;
use crate::pipeline::{Pipeline, SlotPresenter};
use crate::session::shortcuts::{ShortcutContext, handle_key_event};
use crate::wayland::WaylandHelper;
use crate::widget::result_view::{RESULT_SIZE, result_view};
use crate::widget::selection_overlay::SelectionOverlay;

pub(crate) fn run(flags: Flags) -> cosmic::iced::Result {
    let settings = cosmic::app::Settings::default()
        .no_main_window(true)
        .exit_on_close(false);
    cosmic::app::run::<App>(settings, flags)
}

/// Everything a session needs before the first frame
pub struct Flags {
    pub config: SessionConfig,
    pub wayland_helper: WaylandHelper,
}

pub struct App {
    pub core: app::Core,
    pub config: SessionConfig,
    pub outputs: Vec<OutputState>,
    pub phase: Phase,
}

#[derive(Debug, Clone)]
pub struct OutputState {
    pub output: WlOutput,
    pub id: window::Id,
    pub name: String,
    /// Whether an overlay surface is currently open on this output
    pub surface_open: bool,
}

impl OutputState {
    fn open_surface(&self) -> Option<window::Id> {
        self.surface_open.then_some(self.id)
    }
}

/// Where the session is. Phases only move forward.
#[derive(Debug, Clone)]
pub enum Phase {
    /// Waiting for the frozen snapshot of every output
    Capturing,
    /// Overlays are up and the user is dragging a rectangle
    Selecting {
        snapshot: Arc<ScreenSnapshot>,
        selection: Selection,
    },
    /// Overlays are gone, recognition and translation are running
    Processing { output: WlOutput },
    /// The result card is shown
    Presenting {
        window_id: window::Id,
        message: String,
        copy_text: Option<String>,
        copied: bool,
    },
    Finished,
}

/// What the pipeline left for the result card
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub message: Option<String>,
    pub copy_text: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Msg {
    Output(OutputEvent, WlOutput),
    Keyboard(cosmic::iced::keyboard::Event),
    SnapshotCaptured(Result<Arc<ScreenSnapshot>, String>),
    /// Pointer input from the overlay on the named output
    Overlay(String, SelectionEvent),
    Cancel,
    PipelineFinished(PipelineReport),
    CopyResult,
    Close,
}

impl cosmic::Application for App {
    type Executor = cosmic::executor::Default;

    type Flags = Flags;

    type Message = Msg;

    const APP_ID: &'static str = "io.github.snaplingo";

    fn core(&self) -> &app::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut app::Core {
        &mut self.core
    }

    fn init(
        core: app::Core,
        flags: Self::Flags,
    ) -> (Self, cosmic::iced::Task<cosmic::Action<Self::Message>>) {
        let Flags {
            config,
            wayland_helper,
        } = flags;

        let capture = cosmic::Task::perform(
            async move {
                capture_snapshot(wayland_helper)
                    .await
                    .map(Arc::new)
                    .map_err(|err| format!("{err:#}"))
            },
            |result| cosmic::Action::App(Msg::SnapshotCaptured(result)),
        );

        (
            Self {
                core,
                config,
                outputs: Default::default(),
                phase: Phase::Capturing,
            },
            capture,
        )
    }

    fn view(&self) -> cosmic::Element<'_, Self::Message> {
        placeholder()
    }

    fn view_window(&self, id: window::Id) -> cosmic::Element<'_, Self::Message> {
        match &self.phase {
            Phase::Selecting {
                snapshot,
                selection,
            } => {
                let Some(output) = self.outputs.iter().find(|o| o.id == id) else {
                    return placeholder();
                };
                let Some(frozen) = snapshot.get(&output.name) else {
                    return placeholder();
                };
                let is_active = selection.owner() == Some(output.name.as_str());
                let name = output.name.clone();
                SelectionOverlay::new(
                    frozen.image.handle.clone(),
                    selection.rect().filter(|_| is_active),
                    is_active && selection.is_dragging(),
                    move |event| Msg::Overlay(name.clone(), event),
                )
                .into()
            }
            Phase::Presenting {
                window_id,
                message,
                copy_text,
                copied,
            } if *window_id == id => result_view(
                message,
                self.core.system_theme().cosmic().spacing,
                *copied,
                copy_text.as_ref().map(|_| Msg::CopyResult),
                Msg::Close,
            ),
            _ => placeholder(),
        }
    }

    fn update(
        &mut self,
        message: Self::Message,
    ) -> cosmic::iced::Task<cosmic::Action<Self::Message>> {
        match message {
            Msg::Keyboard(cosmic::iced::keyboard::Event::KeyPressed {
                key, modifiers, ..
            }) => {
                if let Some(msg) = handle_key_event(self.shortcut_context(), &key, modifiers) {
                    return self.update(msg);
                }
                cosmic::iced::Task::none()
            }
            Msg::Keyboard(_) => cosmic::iced::Task::none(),
            Msg::SnapshotCaptured(Ok(snapshot)) => {
                if !matches!(self.phase, Phase::Capturing) {
                    return cosmic::iced::Task::none();
                }
                self.phase = Phase::Selecting {
                    snapshot,
                    selection: Selection::new(),
                };
                self.open_overlays()
            }
            Msg::SnapshotCaptured(Err(err)) => {
                log::error!("Failed to capture the screen: {err}");
                eprintln!("ERROR: Unable to capture the screen: {err}");
                self.finish()
            }
            Msg::Overlay(output_name, event) => self.handle_selection(output_name, event),
            Msg::Cancel => {
                let Phase::Selecting { selection, .. } = &mut self.phase else {
                    return cosmic::iced::Task::none();
                };
                selection.handle(SelectionEvent::Cancel);
                log::info!("Selection cancelled");
                self.finish()
            }
            Msg::PipelineFinished(report) => {
                let Phase::Processing { output } = &self.phase else {
                    return cosmic::iced::Task::none();
                };
                let Some(message) = report.message else {
                    return self.finish();
                };
                let output = output.clone();
                let window_id = window::Id::unique();
                self.phase = Phase::Presenting {
                    window_id,
                    message,
                    copy_text: report.copy_text,
                    copied: false,
                };
                get_layer_surface(SctkLayerSurfaceSettings {
                    id: window_id,
                    layer: Layer::Overlay,
                    keyboard_interactivity: KeyboardInteractivity::Exclusive,
                    input_zone: None,
                    anchor: Anchor::empty(),
                    output: IcedOutput::Output(output),
                    namespace: "snaplingo-result".to_string(),
                    size: Some((Some(RESULT_SIZE.0), Some(RESULT_SIZE.1))),
                    exclusive_zone: -1,
                    size_limits: Limits::NONE.min_height(1.0).min_width(1.0),
                    ..Default::default()
                })
            }
            Msg::CopyResult => {
                let Phase::Presenting {
                    copy_text: Some(text),
                    copied,
                    ..
                } = &mut self.phase
                else {
                    return cosmic::iced::Task::none();
                };
                *copied = true;
                clipboard::write(text.clone())
            }
            Msg::Close => {
                let Phase::Presenting { window_id, .. } = &self.phase else {
                    return cosmic::iced::Task::none();
                };
                let destroy = destroy_layer_surface(*window_id);
                cosmic::Task::batch([destroy, self.finish()])
            }
            Msg::Output(o_event, wl_output) => {
                match o_event {
                    OutputEvent::Created(Some(info)) if info.name.is_some() => {
                        self.outputs.push(OutputState {
                            output: wl_output,
                            id: window::Id::unique(),
                            name: info.name.unwrap_or_default(),
                            surface_open: false,
                        });
                        return self.open_overlays();
                    }
                    OutputEvent::Removed => {
                        let closed = remove_outputs(
                            &mut self.outputs,
                            |o| o.output == wl_output,
                            OutputState::open_surface,
                        );
                        return cosmic::Task::batch(closed.into_iter().map(destroy_layer_surface));
                    }
                    OutputEvent::InfoUpdate(info) => {
                        let Some(name) = info.name else {
                            return cosmic::iced::Task::none();
                        };
                        if let Some(state) = self.outputs.iter_mut().find(|o| o.output == wl_output)
                        {
                            state.name = name;
                        } else {
                            log::warn!("Updated output {:?} not found", wl_output);
                            self.outputs.push(OutputState {
                                output: wl_output,
                                id: window::Id::unique(),
                                name,
                                surface_open: false,
                            });
                            return self.open_overlays();
                        }
                    }
                    e => {
                        log::warn!("Unhandled output event: {:?} {e:?}", wl_output);
                    }
                };

                cosmic::iced::Task::none()
            }
        }
    }

    fn subscription(&self) -> cosmic::iced_futures::Subscription<Self::Message> {
        Subscription::batch([listen_with(|e, _, _| match e {
            cosmic::iced_core::Event::PlatformSpecific(
                cosmic::iced_core::event::PlatformSpecific::Wayland(
                    cosmic::iced_core::event::wayland::Event::Output(o_event, wl_output),
                ),
            ) => Some(Msg::Output(o_event, wl_output)),
            cosmic::iced_core::Event::Keyboard(keyboard_event) => {
                Some(Msg::Keyboard(keyboard_event))
            }
            _ => None,
        })])
    }
}

impl App {
    fn shortcut_context(&self) -> ShortcutContext {
        match self.phase {
            Phase::Selecting { .. } => ShortcutContext::Selecting,
            Phase::Presenting { .. } => ShortcutContext::Presenting,
            _ => ShortcutContext::Busy,
        }
    }

    /// Open an overlay on every output that is in the snapshot and has none yet
    fn open_overlays(&mut self) -> cosmic::iced::Task<cosmic::Action<Msg>> {
        let Phase::Selecting { snapshot, .. } = &self.phase else {
            return cosmic::iced::Task::none();
        };

        let cmds: Vec<_> = self
            .outputs
            .iter_mut()
            .filter(|o| !o.surface_open)
            .filter(|o| {
                let known = snapshot.get(&o.name).is_some();
                if !known {
                    log::warn!("Output {} is not in the snapshot, skipping", o.name);
                }
                known
            })
            .map(|o| {
                o.surface_open = true;
                get_layer_surface(SctkLayerSurfaceSettings {
                    id: o.id,
                    layer: Layer::Overlay,
                    keyboard_interactivity: KeyboardInteractivity::Exclusive,
                    input_zone: None,
                    anchor: Anchor::all(),
                    output: IcedOutput::Output(o.output.clone()),
                    namespace: "snaplingo".to_string(),
                    size: Some((None, None)),
                    exclusive_zone: -1,
                    size_limits: Limits::NONE.min_height(1.0).min_width(1.0),
                    ..Default::default()
                })
            })
            .collect();
        cosmic::Task::batch(cmds)
    }

    fn close_overlays(&mut self) -> cosmic::iced::Task<cosmic::Action<Msg>> {
        let cmds: Vec<_> = self
            .outputs
            .iter_mut()
            .filter(|o| o.surface_open)
            .map(|o| {
                o.surface_open = false;
                destroy_layer_surface(o.id)
            })
            .collect();
        cosmic::Task::batch(cmds)
    }

    fn finish(&mut self) -> cosmic::iced::Task<cosmic::Action<Msg>> {
        self.phase = Phase::Finished;
        cosmic::Task::batch([self.close_overlays(), cosmic::iced::exit()])
    }

    fn handle_selection(
        &mut self,
        output_name: String,
        event: SelectionEvent,
    ) -> cosmic::iced::Task<cosmic::Action<Msg>> {
        let Phase::Selecting {
            snapshot,
            selection,
        } = &mut self.phase
        else {
            return cosmic::iced::Task::none();
        };

        match selection.handle_from(&output_name, event) {
            Transition::Ignored | Transition::Redraw => cosmic::iced::Task::none(),
            Transition::Cancelled => self.update(Msg::Cancel),
            Transition::Finished(rect) => {
                let Some(name) = selection.owner().map(str::to_string) else {
                    return self.finish();
                };
                let snapshot = snapshot.clone();
                let Some(frozen) = snapshot.get(&name) else {
                    log::error!("Output {name} vanished from the snapshot");
                    return self.finish();
                };
                let Some(cropped) = crop_logical(&frozen.image.rgba, frozen.logical_size, rect)
                else {
                    log::warn!("Selection {:?} lies outside output {name}", rect);
                    return self.finish();
                };
                let Some(output) = self
                    .outputs
                    .iter()
                    .find(|o| o.name == name)
                    .map(|o| o.output.clone())
                else {
                    log::error!("Output {name} is gone");
                    return self.finish();
                };

                log::info!(
                    "Selected {:?} on {name}, pixels {:?}",
                    rect,
                    cropped.region
                );
                self.phase = Phase::Processing { output };
                let destroy = self.close_overlays();

                let config = self.config.clone();
                let process = cosmic::Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || run_pipeline(&config, &cropped.image))
                            .await
                            .unwrap_or_else(|err| {
                                log::error!("Pipeline task failed: {err}");
                                PipelineReport::default()
                            })
                    },
                    |report| cosmic::Action::App(Msg::PipelineFinished(report)),
                );
                cosmic::Task::batch([destroy, process])
            }
        }
    }
}

/// Recognize and translate `image`, blocking the calling thread
fn run_pipeline(config: &SessionConfig, image: &RgbaImage) -> PipelineReport {
    let recognizer = TesseractRecognizer::new(config.source_lang.clone(), config.ocr_timeout);
    let translator_config = config.clone();
    let pipeline = Pipeline::new(
        Box::new(recognizer),
        move || crate::translate::from_config(&translator_config),
        config.target_lang.clone(),
    );

    let mut presenter = SlotPresenter::default();
    let outcome = pipeline.run(image, &mut presenter);
    PipelineReport {
        message: presenter.message,
        copy_text: outcome.translated_text().map(str::to_string),
    }
}

fn placeholder<'a>() -> cosmic::Element<'a, Msg> {
    horizontal_space()
        .width(cosmic::iced_core::Length::Fixed(1.0))
        .into()
}

/// Drop every output matching `is_removed` and return the overlay surfaces
/// still open on them
fn remove_outputs<T>(
    outputs: &mut Vec<T>,
    is_removed: impl Fn(&T) -> bool,
    open_surface: impl Fn(&T) -> Option<window::Id>,
) -> Vec<window::Id> {
    let mut closed = Vec::new();
    outputs.retain(|o| {
        if !is_removed(o) {
            return true;
        }
        closed.extend(open_surface(o));
        false
    });
    closed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_output_surface_is_closed() {
        let open = window::Id::unique();
        let other = window::Id::unique();
        let mut outputs = vec![("DP-1", Some(open)), ("HDMI-A-1", Some(other))];

        let closed = remove_outputs(&mut outputs, |o| o.0 == "DP-1", |o| o.1);

        assert_eq!(closed, vec![open]);
        assert_eq!(outputs, vec![("HDMI-A-1", Some(other))]);
    }

    #[test]
    fn test_removed_output_without_surface() {
        let mut outputs: Vec<(&str, Option<window::Id>)> =
            vec![("DP-1", None), ("HDMI-A-1", None)];

        let closed = remove_outputs(&mut outputs, |o| o.0 == "HDMI-A-1", |o| o.1);

        assert!(closed.is_empty());
        assert_eq!(outputs, vec![("DP-1", None)]);
    }
}
