//! Modal card showing the single result of a session

use cosmic::Element;
use cosmic::cosmic_theme::Spacing;
use cosmic::iced::Length;
use cosmic::iced_core::{Alignment, Border};
use cosmic::iced_widget::{column, row};
use cosmic::widget::{button, container, horizontal_space, scrollable, text};

use crate::fl;

/// Size of the result surface in logical pixels
pub const RESULT_SIZE: (u32, u32) = (480, 280);

/// Build the result card. `on_copy` is `None` when there is nothing to copy.
pub fn result_view<'a, Msg: Clone + 'static>(
    message: &'a str,
    spacing: Spacing,
    copied: bool,
    on_copy: Option<Msg>,
    on_close: Msg,
) -> Element<'a, Msg> {
    let copy_label = if copied { fl!("copied") } else { fl!("copy") };
    let buttons = row![
        horizontal_space(),
        button::standard(copy_label).on_press_maybe(on_copy),
        button::suggested(fl!("close")).on_press(on_close),
    ]
    .spacing(spacing.space_s)
    .align_y(Alignment::Center)
    .width(Length::Fill);

    let content = column![
        text::title4(fl!("result-title")),
        scrollable(text::body(message).width(Length::Fill)).height(Length::Fill),
        buttons,
    ]
    .spacing(spacing.space_s)
    .padding(spacing.space_m)
    .width(Length::Fill)
    .height(Length::Fill);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .class(cosmic::theme::Container::Custom(Box::new(|theme| {
            let cosmic_theme = theme.cosmic();
            cosmic::iced::widget::container::Style {
                background: Some(cosmic::iced::Color::from(cosmic_theme.background.base).into()),
                text_color: Some(cosmic_theme.background.on.into()),
                border: Border {
                    radius: cosmic_theme.radius_m().into(),
                    width: 1.0,
                    color: cosmic_theme.background.divider.into(),
                },
                ..Default::default()
            }
        })))
        .into()
}
