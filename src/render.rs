use crate::models::EventRecord;
use crate::utils::escape_html;
use crate::widget::ViewState;

const NO_RESULTS: &str = "No events found for your search.";

pub fn render_view(state: &ViewState) -> String {
    match state {
        ViewState::Idle => String::new(),
        ViewState::Loading => "<div class=\"loading\">Loading…</div>".to_string(),
        ViewState::Events(events) => render_cards(events),
        ViewState::NoResults => render_error(NO_RESULTS),
        ViewState::Error(message) => render_error(message),
    }
}

pub fn render_cards(events: &[EventRecord]) -> String {
    events.iter().map(render_card).collect::<Vec<_>>().join("\n")
}

fn render_card(event: &EventRecord) -> String {
    let artist = escape_html(&event.artist);
    let venue = escape_html(&event.venue);
    let tickets = match &event.ticket_url {
        Some(url) => format!(
            "<p><a href=\"{url}\" target=\"_blank\" aria-label=\"Get tickets for {artist} at {venue}\">Get Tickets</a></p>",
            url = escape_html(url),
            artist = artist,
            venue = venue,
        ),
        None => "<p>No ticket link available</p>".to_string(),
    };

    format!(
        "<div class=\"event-card\">\n  <h3>{artist}</h3>\n  <p><strong>Date:</strong> {date}</p>\n  <p><strong>Venue:</strong> {venue}</p>\n  <p><strong>City:</strong> {city}, {country}</p>\n  {tickets}\n</div>",
        artist = artist,
        date = escape_html(&event.date),
        venue = venue,
        city = escape_html(&event.city),
        country = escape_html(&event.country_code),
        tickets = tickets,
    )
}

fn render_error(message: &str) -> String {
    format!("<p class=\"error\">{}</p>", escape_html(message))
}

/// Plain-text counterpart of `render_view` for terminals.
pub fn render_text(state: &ViewState) -> String {
    match state {
        ViewState::Idle | ViewState::Loading => String::new(),
        ViewState::NoResults => NO_RESULTS.to_string(),
        ViewState::Error(message) => format!("Error: {message}"),
        ViewState::Events(events) => events
            .iter()
            .map(|event| {
                let tickets = event
                    .ticket_url
                    .clone()
                    .unwrap_or_else(|| "No ticket link available".to_string());
                format!(
                    "{title}\n  {date}\n  {venue}, {city}, {country}\n  Tickets: {tickets}",
                    title = event.artist,
                    date = event.date,
                    venue = event.venue,
                    city = event.city,
                    country = event.country_code,
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn record(ticket_url: Option<&str>) -> EventRecord {
        EventRecord {
            artist: "Simon & Garfunkel".to_string(),
            venue: "Madison Square Garden".to_string(),
            city: "New York".to_string(),
            country_code: "US".to_string(),
            date: "July 4, 2025".to_string(),
            ticket_url: ticket_url.map(str::to_string),
        }
    }

    fn select<'a>(doc: &'a Html, css: &str) -> Vec<scraper::ElementRef<'a>> {
        let selector = Selector::parse(css).expect("selector");
        doc.select(&selector).collect()
    }

    #[test]
    fn renders_one_card_per_event_with_ticket_link() {
        let html = render_cards(&[
            record(Some("https://tm.example/e?a=1&b=2")),
            record(None),
        ]);
        let doc = Html::parse_fragment(&html);

        let cards = select(&doc, "div.event-card");
        assert_eq!(cards.len(), 2);

        let headings = select(&doc, "div.event-card h3");
        assert_eq!(headings[0].text().collect::<String>(), "Simon & Garfunkel");

        let links = select(&doc, "div.event-card a");
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].value().attr("href"),
            Some("https://tm.example/e?a=1&b=2")
        );
        assert_eq!(
            links[0].value().attr("aria-label"),
            Some("Get tickets for Simon & Garfunkel at Madison Square Garden")
        );
        assert!(html.contains("<p>No ticket link available</p>"));
        assert!(html.contains("<strong>City:</strong> New York, US"));
    }

    #[test]
    fn markup_in_fields_is_escaped() {
        let mut event = record(None);
        event.artist = "<script>alert(1)</script>".to_string();
        let html = render_cards(&[event]);
        let doc = Html::parse_fragment(&html);
        assert!(select(&doc, "script").is_empty());
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_and_error_states_render_messages() {
        assert_eq!(
            render_view(&ViewState::NoResults),
            "<p class=\"error\">No events found for your search.</p>"
        );
        assert_eq!(
            render_view(&ViewState::Error("Failed to load featured events.".to_string())),
            "<p class=\"error\">Failed to load featured events.</p>"
        );
        assert_eq!(render_view(&ViewState::Idle), "");
    }

    #[test]
    fn text_covers_every_view_state() {
        assert_eq!(render_text(&ViewState::NoResults), "No events found for your search.");
        assert_eq!(
            render_text(&ViewState::Error("Failed to load featured events.".to_string())),
            "Error: Failed to load featured events."
        );
        assert_eq!(render_text(&ViewState::Loading), "");
        assert_eq!(render_text(&ViewState::Idle), "");
    }

    #[test]
    fn text_listing_shows_placeholder_link() {
        let text = render_text(&ViewState::Events(vec![record(None)]));
        assert!(text.starts_with("Simon & Garfunkel\n  July 4, 2025"));
        assert!(text.ends_with("Tickets: No ticket link available"));
    }
}
