//! Full-surface widget showing the frozen output with the selection cut out
//! of a dark scrim.

use cosmic::{
    iced::mouse,
    iced_core::{
        self, Border, Color, Length, Rectangle, Shadow, Size, layout::Node, renderer::Quad,
    },
    iced_core::Renderer,
    widget::{Widget, image::Handle},
};

use crate::domain::{Point, Rect, SelectionEvent, scrim_bands};

/// Scrim alpha, out of 255
const SCRIM_ALPHA: u8 = 100;
const BORDER_WIDTH: f32 = 3.0;

pub struct SelectionOverlay<Msg> {
    image: Handle,
    selection: Option<Rect>,
    dragging: bool,
    on_event: Box<dyn Fn(SelectionEvent) -> Msg>,
}

impl<Msg: Clone> SelectionOverlay<Msg> {
    pub fn new(
        image: Handle,
        selection: Option<Rect>,
        dragging: bool,
        on_event: impl Fn(SelectionEvent) -> Msg + 'static,
    ) -> Self {
        Self {
            image,
            selection,
            dragging,
            on_event: Box::new(on_event),
        }
    }
}

/// Surface-local pointer position, clamped to the surface
fn local_point(bounds: Rectangle, position: cosmic::iced::Point) -> Point {
    Point::new(
        (position.x - bounds.x).round() as i32,
        (position.y - bounds.y).round() as i32,
    )
    .clamp_to(Rect::from_size(
        bounds.width.max(0.0) as u32,
        bounds.height.max(0.0) as u32,
    ))
}

fn to_rectangle(bounds: Rectangle, rect: Rect) -> Rectangle {
    Rectangle {
        x: bounds.x + rect.left as f32,
        y: bounds.y + rect.top as f32,
        width: rect.width() as f32,
        height: rect.height() as f32,
    }
}

impl<Msg: 'static + Clone> Widget<Msg, cosmic::Theme, cosmic::Renderer> for SelectionOverlay<Msg> {
    fn size(&self) -> Size<Length> {
        Size::new(Length::Fill, Length::Fill)
    }

    fn layout(
        &self,
        _tree: &mut cosmic::iced_core::widget::Tree,
        _renderer: &cosmic::Renderer,
        limits: &cosmic::iced_core::layout::Limits,
    ) -> cosmic::iced_core::layout::Node {
        Node::new(limits.width(Length::Fill).height(Length::Fill).resolve(
            Length::Fill,
            Length::Fill,
            cosmic::iced_core::Size::ZERO,
        ))
    }

    fn tag(&self) -> iced_core::widget::tree::Tag {
        struct MyState;
        iced_core::widget::tree::Tag::of::<MyState>()
    }

    fn mouse_interaction(
        &self,
        _state: &iced_core::widget::Tree,
        _layout: iced_core::Layout<'_>,
        _cursor: iced_core::mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &cosmic::Renderer,
    ) -> iced_core::mouse::Interaction {
        iced_core::mouse::Interaction::Crosshair
    }

    fn on_event(
        &mut self,
        _state: &mut iced_core::widget::Tree,
        event: iced_core::Event,
        layout: iced_core::Layout<'_>,
        cursor: iced_core::mouse::Cursor,
        _renderer: &cosmic::Renderer,
        _clipboard: &mut dyn iced_core::Clipboard,
        shell: &mut iced_core::Shell<'_, Msg>,
        _viewport: &Rectangle,
    ) -> iced_core::event::Status {
        let bounds = layout.bounds();
        let cosmic::iced_core::Event::Mouse(e) = event else {
            return cosmic::iced_core::event::Status::Ignored;
        };

        match e {
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                let Some(position) = cursor.position_over(bounds) else {
                    return cosmic::iced_core::event::Status::Ignored;
                };
                shell.publish((self.on_event)(SelectionEvent::PointerDown(local_point(
                    bounds, position,
                ))));
                cosmic::iced_core::event::Status::Captured
            }
            mouse::Event::CursorMoved { position } if self.dragging => {
                shell.publish((self.on_event)(SelectionEvent::PointerMove(local_point(
                    bounds, position,
                ))));
                cosmic::iced_core::event::Status::Captured
            }
            // The release may land on another output, so it is reported
            // whether or not this surface owns the drag.
            mouse::Event::ButtonReleased(mouse::Button::Left) => {
                shell.publish((self.on_event)(SelectionEvent::PointerUp));
                cosmic::iced_core::event::Status::Captured
            }
            _ => cosmic::iced_core::event::Status::Ignored,
        }
    }

    fn draw(
        &self,
        _tree: &cosmic::iced_core::widget::Tree,
        renderer: &mut cosmic::Renderer,
        _theme: &cosmic::Theme,
        _style: &cosmic::iced_core::renderer::Style,
        layout: cosmic::iced_core::Layout<'_>,
        _cursor: cosmic::iced_core::mouse::Cursor,
        _viewport: &cosmic::iced_core::Rectangle,
    ) {
        let bounds = layout.bounds();

        cosmic::iced_core::image::Renderer::draw_image(
            renderer,
            self.image.clone(),
            cosmic::iced_core::image::FilterMethod::Linear,
            bounds,
            cosmic::iced::Radians(0.0),
            1.0,
            [0.0, 0.0, 0.0, 0.0],
        );

        let surface = Rect::from_size(bounds.width as u32, bounds.height as u32);
        let scrim = Color::from_rgba8(0, 0, 0, SCRIM_ALPHA as f32 / 255.0);
        for band in scrim_bands(surface, self.selection) {
            renderer.fill_quad(
                Quad {
                    bounds: to_rectangle(bounds, band),
                    border: Border::default(),
                    shadow: Shadow::default(),
                },
                scrim,
            );
        }

        let Some(selection) = self.selection.and_then(|s| s.intersect(surface)) else {
            return;
        };
        renderer.fill_quad(
            Quad {
                bounds: to_rectangle(bounds, selection),
                border: Border {
                    radius: 0.0.into(),
                    width: BORDER_WIDTH,
                    color: Color::WHITE,
                },
                shadow: Shadow::default(),
            },
            Color::TRANSPARENT,
        );
    }
}

impl<'a, Message> From<SelectionOverlay<Message>> for cosmic::Element<'a, Message>
where
    Message: 'static + Clone,
{
    fn from(w: SelectionOverlay<Message>) -> cosmic::Element<'a, Message> {
        cosmic::Element::new(w)
    }
}
