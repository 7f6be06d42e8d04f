use url::Url;

/// Extracts the video id from a YouTube link.
///
/// Recognises `youtube.com/watch?v=ID`, `youtube.com/embed/ID` (any
/// subdomain, e.g. `www.` or `m.`) and `youtu.be/ID`. The scheme may be
/// omitted. Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use newsdesk::util::extract_youtube_id;
///
/// assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
/// assert_eq!(extract_youtube_id("https://vimeo.com/1234"), None);
/// ```
pub fn extract_youtube_id(link: &str) -> Option<String> {
    let link = link.trim();
    let url = Url::parse(link)
        .or_else(|_| Url::parse(&format!("https://{link}")))
        .ok()?;
    let host = url.host_str()?;

    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    id.filter(|id| !id.is_empty())
}
