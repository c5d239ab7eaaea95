//! Reply body composition

const QUOTE: &str = "\
> Diese Zeitung ist ein Organ der Niedertracht. Es ist falsch, sie zu lesen.\n\
> Jemand, der zu dieser Zeitung beiträgt, ist gesellschaftlich absolut inakzeptabel.\n\
> Es wäre verfehlt, zu einem ihrer Redakteure freundlich oder auch nur höflich zu sein.\n\
> Man muß so unfreundlich zu ihnen sein, wie es das Gesetz gerade noch zuläßt.\n\
> Es sind schlechte Menschen, die Falsches tun.\n\n\
[Max Goldt](https://de.wikipedia.org/wiki/Max_Goldt), deutscher Schriftsteller\n\n\
Du kannst diesen Artikel auf archive.is lesen, wenn du nicht auf bild.de gehen willst:\n\n";

const FOOTER: &str = "\
----\n\n\
^^[Info](https://www.reddit.com/r/MaxGoldtBot)&nbsp;|&nbsp;\
[Autor](https://www.reddit.com/u/pille1842)&nbsp;|&nbsp;\
[GitHub](https://github.com/pille1842/MaxGoldtBot)&nbsp;|&nbsp;\
[Warum&nbsp;die&nbsp;Bild&nbsp;schlecht&nbsp;ist]\
(http://www.bildblog.de/62600/warum-wir-gegen-die-bild-zeitung-kaempfen/)";

/// Build the reply body for a non-empty list of archived URLs.
///
/// Callers skip the reply entirely when nothing was archived.
pub fn compose_reply(archive_urls: &[String]) -> String {
    debug_assert!(!archive_urls.is_empty(), "reply composed without links");

    let mut body = String::with_capacity(QUOTE.len() + FOOTER.len() + archive_urls.len() * 48);
    body.push_str(QUOTE);
    for url in archive_urls {
        body.push_str("- ");
        body.push_str(url);
        body.push('\n');
    }
    body.push('\n');
    body.push_str(FOOTER);
    body
}
