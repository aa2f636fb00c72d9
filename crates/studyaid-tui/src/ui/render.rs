use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use studyaid_core::SessionState;

use crate::app::{App, AppState, LoginFocus, Profile};

use super::styles;

const LOGO: [&str; 3] = [
    "   ╔═╗╔╦╗╦ ╦╔╦╗╦ ╦  ╔═╗╦╔╦╗",
    "   ╚═╗ ║ ║ ║ ║║╚╦╝  ╠═╣║ ║║",
    "   ╚═╝ ╩ ╚═╝═╩╝ ╩   ╩ ╩╩═╩╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    match app.session {
        SessionState::Checking => render_checking(frame, chunks[1]),
        SessionState::Unauthenticated => render_login(frame, app),
        SessionState::Authenticated => render_session(frame, app, chunks[1]),
    }
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ConfirmingLogout => {
            render_confirm_overlay(frame, "Sign out of StudyAid?", "to sign out")
        }
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", "to quit")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| Line::from(Span::styled(*row, styles::title_style())))
        .collect()
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  StudyAid";
    let state = app.session.label();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + state.len() as u16 + 4) as usize,
        )),
        Span::styled(state, styles::presence_style(app.session.is_authenticated())),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_checking(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(40, 3, area);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "  Checking session...",
        styles::muted_style(),
    )));
    frame.render_widget(paragraph, area);
}

fn input_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::text_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{:<24}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(46, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    // Show the tail of long addresses
    let email: String = {
        let chars: Vec<char> = app.login_email.chars().collect();
        let start = chars.len().saturating_sub(24);
        chars[start..].iter().collect()
    };
    lines.push(input_line(
        "Email:    [",
        email,
        app.login_focus == LoginFocus::Email,
    ));
    lines.push(input_line(
        "Password: [",
        "*".repeat(app.login_password.chars().count().min(24)),
        app.login_focus == LoginFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if app.login_in_progress {
        " Signing in "
    } else if button_focused {
        " ▶ Login ◀ "
    } else {
        "   Login   "
    };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::text_style()
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field<'a>(label: &'a str, value: String, style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<14}", label), styles::muted_style()),
        Span::styled(value, style),
    ])
}

fn yes_no(present: bool) -> String {
    if present { "present" } else { "absent" }.to_string()
}

fn render_session(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Profile
    let profile_lines = match &app.profile {
        Some(Profile::Loaded(user)) => vec![
            field("Username", user.username.clone(), styles::text_style()),
            field("Email", user.email.clone(), styles::text_style()),
            field("Role", user.role().to_string(), styles::highlight_style()),
            field("Last login", user.last_login_display(), styles::text_style()),
        ],
        Some(Profile::Failed(message)) => vec![
            Line::from(Span::styled(format!("  {}", message), styles::error_style())),
            Line::from(""),
            Line::from(vec![
                Span::styled("  Press ", styles::muted_style()),
                Span::styled("[r]", styles::key_style()),
                Span::styled(" to retry", styles::muted_style()),
            ]),
        ],
        Some(Profile::Loading) | None => vec![Line::from(Span::styled(
            "  Loading profile...",
            styles::muted_style(),
        ))],
    };
    let profile_block = Block::default()
        .title(Span::styled(" Profile ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(profile_lines).block(profile_block), chunks[0]);

    // Session copies
    let last_change = app
        .last_change
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let session_lines = vec![
        field(
            "Stored token",
            yes_no(app.token_present),
            styles::presence_style(app.token_present),
        ),
        field(
            "Cookie",
            yes_no(app.cookie_present),
            styles::presence_style(app.cookie_present),
        ),
        field("Origin", app.cookie_origin().to_string(), styles::text_style()),
        field(
            "Poll every",
            format!("{} ms", app.poll_interval().as_millis()),
            styles::text_style(),
        ),
        field("Last change", last_change, styles::text_style()),
    ];
    let session_block = Block::default()
        .title(Span::styled(" Session ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(session_lines).block(session_block), chunks[1]);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let keys: &[(&str, &str)] = match app.session {
        SessionState::Authenticated => &[("[l]", " Logout  "), ("[r]", " Refresh  "), ("[q]", " Quit")],
        SessionState::Unauthenticated => &[("[Tab]", " Next field  "), ("[Enter]", " Submit  "), ("[Esc]", " Quit")],
        SessionState::Checking => &[("[q]", " Quit")],
    };

    let mut spans = vec![Span::raw(" ")];
    for (key, desc) in keys {
        spans.push(Span::styled(*key, styles::key_style()));
        spans.push(Span::raw(*desc));
    }
    if let Some(ref message) = app.status_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(message.clone(), styles::highlight_style()));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(styles::status_bar_style()),
        area,
    );
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 10, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("   {}", question),
        styles::highlight_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::muted_style()),
        Span::styled("[Y]", styles::key_style()),
        Span::styled(format!(" {}, ", action), styles::muted_style()),
        Span::styled("[N]", styles::key_style()),
        Span::styled(" to cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect_fixed(46, 10, outer);
        assert_eq!(inner, Rect::new(27, 15, 46, 10));

        // Never larger than the screen
        let tiny = Rect::new(0, 0, 20, 5);
        let clipped = centered_rect_fixed(46, 10, tiny);
        assert_eq!((clipped.width, clipped.height), (20, 5));
    }
}
