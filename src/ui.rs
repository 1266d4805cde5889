use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use std::ops::Range;
use unicode_width::UnicodeWidthStr;

use typeduel::{
    clock::format_clock,
    session::{Mode, RaceOutcome, SessionState},
    util::visible_char,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Styles for one lane's three segments.
struct LaneStyle {
    correct: Style,
    mismatch: Style,
    pending: Style,
}

fn slice(chars: &[char], range: &Range<usize>) -> String {
    chars[range.start..range.end].iter().collect()
}

fn lane_spans(
    target: &[char],
    correct: &Range<usize>,
    mismatch: &Range<usize>,
    pending: &Range<usize>,
    style: &LaneStyle,
) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(3);
    if !correct.is_empty() {
        spans.push(Span::styled(slice(target, correct), style.correct));
    }
    if !mismatch.is_empty() {
        let wrong: String = target[mismatch.start..mismatch.end]
            .iter()
            .map(|c| visible_char(*c))
            .collect();
        spans.push(Span::styled(wrong, style.mismatch));
    }
    if !pending.is_empty() {
        spans.push(Span::styled(slice(target, pending), style.pending));
    }
    spans
}

fn lines_needed(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    (text.width().div_ceil(width)).max(1) as u16
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session();
        let render = session.render_state();

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_underlined_style = Style::default()
            .patch(bold_style)
            .fg(Color::Red)
            .add_modifier(Modifier::UNDERLINED);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let magenta_style = Style::default().fg(Color::Magenta);

        let text_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
        let target_lines = lines_needed(session.target().as_str(), text_width);
        let opponent = session.opponent_render_state();
        let opponent_lines = if opponent.is_some() { target_lines + 1 } else { 0 };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),              // header
                Constraint::Length(1),              // padding
                Constraint::Length(target_lines + 1), // your lane
                Constraint::Length(opponent_lines), // opponent lane
                Constraint::Length(target_lines + 1), // input echo
                Constraint::Length(1),              // stats
                Constraint::Length(2),              // status / results
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        let clock_label = match render.seconds_remaining {
            Some(remaining) => format!("{} left", format_clock(remaining)),
            None => format_clock(render.elapsed_seconds),
        };
        let header = Line::from(vec![
            Span::styled(format!("Typing {}", mode_title(session.mode())), bold_style),
            Span::raw("   "),
            Span::styled(clock_label, dim_bold_style),
        ]);
        Paragraph::new(header).render(chunks[0], buf);

        let human_style = LaneStyle {
            correct: green_bold_style,
            mismatch: red_underlined_style,
            pending: dim_bold_style,
        };
        let target = session.target().chars();
        let mut lane = vec![Line::from(Span::styled("You", italic_style))];
        lane.push(Line::from(lane_spans(
            target,
            &render.correct_range,
            &render.mismatch_range,
            &render.pending_range,
            &human_style,
        )));
        Paragraph::new(lane)
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        if let Some(opp) = &opponent {
            let opponent_style = LaneStyle {
                correct: magenta_style.patch(bold_style),
                mismatch: red_underlined_style,
                pending: dim_bold_style,
            };
            let lane = vec![
                Line::from(Span::styled(
                    format!("Opponent ({} slips)", opp.slips),
                    italic_style,
                )),
                Line::from(lane_spans(
                    target,
                    &opp.correct_range,
                    &opp.mismatch_range,
                    &opp.pending_range,
                    &opponent_style,
                )),
            ];
            Paragraph::new(lane)
                .wrap(Wrap { trim: false })
                .render(chunks[3], buf);
        }

        let typed = session.typed();
        let cursor = render.cursor.min(typed.len());
        let mut echo = vec![Span::styled("> ", dim_bold_style)];
        echo.push(Span::raw(typed[..cursor].iter().collect::<String>()));
        let under_cursor = typed.get(cursor).copied().unwrap_or(' ');
        let cursor_style = if render.state == SessionState::Finished {
            Style::default()
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        };
        echo.push(Span::styled(under_cursor.to_string(), cursor_style));
        if cursor + 1 < typed.len() {
            echo.push(Span::raw(typed[cursor + 1..].iter().collect::<String>()));
        }
        Paragraph::new(Line::from(echo))
            .wrap(Wrap { trim: false })
            .render(chunks[4], buf);

        let stats = Paragraph::new(Span::styled(
            format!(
                "Time: {} | WPM: {:.1} | Accuracy: {:.1}% | Mistakes: {}",
                format_clock(render.elapsed_seconds),
                render.live_wpm,
                render.live_accuracy_percent,
                render.mistakes
            ),
            bold_style,
        ));
        stats.render(chunks[5], buf);

        let mut status_lines = Vec::new();
        if session.is_race() {
            match session.race_outcome() {
                RaceOutcome::OpponentWon => status_lines.push(Line::from(Span::styled(
                    "The opponent finished first.",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ))),
                RaceOutcome::HumanWon => status_lines.push(Line::from(Span::styled(
                    "You won the race!",
                    green_bold_style,
                ))),
                RaceOutcome::Undecided => {}
            }
        }
        match self.state {
            AppState::Results => {
                if let Some(result) = session.result() {
                    let verdict = if result.completed {
                        "Perfect!"
                    } else {
                        "Round ended before the text was complete."
                    };
                    status_lines.push(Line::from(vec![
                        Span::styled(verdict, bold_style),
                        Span::raw("  "),
                        Span::styled(self.driver.sink().describe(), italic_style),
                    ]));
                }
            }
            AppState::Typing => {
                if let Some(status) = &self.status {
                    status_lines.push(Line::from(Span::styled(
                        status.clone(),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
        }
        Paragraph::new(status_lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        let legend = match (self.state, session.mode()) {
            (AppState::Results, _) => "(r)etry / (n)ew / (esc)ape",
            (AppState::Typing, Mode::Race) => {
                "(enter) check / (^r) restart / (^n) next / (esc)ape"
            }
            (AppState::Typing, Mode::Practice | Mode::Exercise) => {
                "(enter) check / (tab) finish / (^r) restart / (^n) next / (esc)ape"
            }
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[8], buf);
    }
}

fn mode_title(mode: Mode) -> &'static str {
    match mode {
        Mode::Practice => "Practice",
        Mode::Exercise => "Exercise",
        Mode::Race => "Race",
    }
}
