use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{top_level, CardNode, Marker};

static SELECTORS: LazyLock<[Selector; Marker::ALL.len()]> = LazyLock::new(|| {
    Marker::ALL.map(|marker| Selector::parse(marker.css()).expect("Invalid selector"))
});

fn selector(marker: Marker) -> &'static Selector {
    &SELECTORS[marker.index()]
}

/// A parsed page (or page fragment) holding rendered post cards.
pub struct HtmlSnapshot {
    document: Html,
}

impl HtmlSnapshot {
    /// Parse a full HTML document.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Parse an HTML fragment, such as a single copied card.
    #[must_use]
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            document: Html::parse_fragment(html),
        }
    }

    /// Every card in the snapshot, nested ones included, in document order.
    #[must_use]
    pub fn cards(&self) -> Vec<HtmlCard<'_>> {
        self.document
            .select(selector(Marker::Card))
            .map(HtmlCard::new)
            .collect()
    }

    /// Cards that are not embedded inside another card.
    ///
    /// These are the cards a feed shows as separate entries; nested ones are
    /// quoted posts and belong to their outer card.
    #[must_use]
    pub fn top_level_cards(&self) -> Vec<HtmlCard<'_>> {
        top_level(&self.cards())
    }
}

/// [`CardNode`] over a `scraper` element.
#[derive(Debug, Clone, Copy)]
pub struct HtmlCard<'a> {
    element: ElementRef<'a>,
}

impl<'a> HtmlCard<'a> {
    #[must_use]
    pub const fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// The underlying element.
    #[must_use]
    pub const fn element(&self) -> ElementRef<'a> {
        self.element
    }

    /// Text nodes in document order, skipping those under a `hidden`
    /// descendant. This element's own `hidden` flag is ignored.
    fn rendered_runs(&self) -> impl Iterator<Item = &'a str> + '_ {
        let own_id = self.element.id();
        self.element.descendants().filter_map(move |node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != own_id)
                .filter_map(ElementRef::wrap)
                .any(|el| el.value().attr("hidden").is_some());
            (!hidden).then_some(&**text)
        })
    }

    fn descendants(&self, marker: Marker) -> impl Iterator<Item = HtmlCard<'a>> + '_ {
        let own_id = self.element.id();
        self.element
            .select(selector(marker))
            .filter(move |el| el.id() != own_id)
            .map(HtmlCard::new)
    }
}

impl CardNode for HtmlCard<'_> {
    fn find_first(&self, marker: Marker) -> Option<Self> {
        self.descendants(marker).next()
    }

    fn find_all(&self, marker: Marker) -> Vec<Self> {
        self.descendants(marker).collect()
    }

    fn text(&self) -> String {
        self.rendered_runs().collect()
    }

    fn text_blocks(&self) -> Vec<String> {
        self.rendered_runs()
            .map(str::trim)
            .filter(|run| !run.is_empty())
            .map(String::from)
            .collect()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.element.value().attr(name).map(String::from)
    }

    fn parent(&self) -> Option<Self> {
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(HtmlCard::new)
    }

    fn matches(&self, marker: Marker) -> bool {
        selector(marker).matches(&self.element)
    }

    fn same_node(&self, other: &Self) -> bool {
        self.element.id() == other.element.id()
    }

    fn is_strict_descendant_of(&self, ancestor: &Self) -> bool {
        let target = ancestor.element.id();
        self.element.ancestors().any(|node| node.id() == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
        <div id="wrapper">
            <article data-testid="tweet">
                <div data-testid="User-Name"><span>Alice</span><span>@alice</span><span>·</span></div>
                <div data-testid="tweetText"><span>hello </span><a href="/bob">@bob</a></div>
                <a href="/alice/status/111"><time datetime="2024-05-01T10:00:00.000Z">May 1</time></a>
            </article>
        </div>
    "#;

    #[test]
    fn test_find_first_and_text() {
        let snapshot = HtmlSnapshot::parse(CARD);
        let card = snapshot.cards()[0];

        let text = card.find_first(Marker::PostText).unwrap();
        assert_eq!(text.text(), "hello @bob");

        let author = card.find_first(Marker::AuthorName).unwrap();
        assert_eq!(author.text_blocks(), vec!["Alice", "@alice", "·"]);
    }

    #[test]
    fn test_text_skips_hidden_descendants() {
        let snapshot = HtmlSnapshot::parse(
            r#"<article data-testid="tweet">
                <div data-testid="tweetText">shown<span hidden> secret</span></div>
            </article>"#,
        );
        let card = snapshot.cards()[0];
        assert_eq!(card.text().trim(), "shown");

        let span = card
            .find_first(Marker::TextRun)
            .and_then(|div| div.find_first(Marker::TextRun))
            .unwrap();
        assert_eq!(span.text(), " secret");
    }

    #[test]
    fn test_attributes_and_links() {
        let snapshot = HtmlSnapshot::parse(CARD);
        let card = snapshot.cards()[0];

        let link = card.find_first(Marker::StatusLink).unwrap();
        assert_eq!(link.attr("href").as_deref(), Some("/alice/status/111"));
        assert!(link.attr("title").is_none());

        let time = card.find_first(Marker::Timestamp).unwrap();
        assert_eq!(
            time.attr("datetime").as_deref(),
            Some("2024-05-01T10:00:00.000Z")
        );
    }

    #[test]
    fn test_containment_and_closest() {
        let snapshot = HtmlSnapshot::parse(CARD);
        let card = snapshot.cards()[0];
        let time = card.find_first(Marker::Timestamp).unwrap();

        assert!(time.is_strict_descendant_of(&card));
        assert!(!card.is_strict_descendant_of(&card));
        assert!(!card.is_strict_descendant_of(&time));

        let closest = time.closest(Marker::Card).unwrap();
        assert!(closest.same_node(&card));
        assert!(card.closest(Marker::Card).unwrap().same_node(&card));
        assert!(time.closest(Marker::LinkContainer).is_none());
    }

    #[test]
    fn test_find_all_excludes_self() {
        let snapshot = HtmlSnapshot::parse(
            r#"<article data-testid="tweet"><article data-testid="tweet"></article></article>"#,
        );
        let outer = snapshot.top_level_cards()[0];
        let nested = outer.find_all(Marker::Card);
        assert_eq!(nested.len(), 1);
        assert!(!nested[0].same_node(&outer));
    }

    #[test]
    fn test_fragment_parsing() {
        let snapshot = HtmlSnapshot::parse_fragment(
            r#"<article data-testid="tweet"><div data-testid="tweetPhoto"></div></article>"#,
        );
        let cards = snapshot.top_level_cards();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].find_first(Marker::Media).is_some());
    }
}
