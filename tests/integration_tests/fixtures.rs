//! Test fixtures for integration tests
//!
//! Sample pages, feeds and sitemaps served from wiremock.

/// Headline plus one short paragraph and nothing else
///
/// The paragraph clears the summary threshold but not the body thresholds.
pub const HEADLINE_ONLY_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
  <h1>Test Headline Here</h1>
  <p>Short paragraph of text here.</p>
</body>
</html>"#;

/// Page with metadata only in Open Graph and JSON-LD
pub const STRUCTURED_DATA_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta property="og:title" content="Council Approves New Transit Budget">
  <script type="application/ld+json">
  {"@context": "https://schema.org", "@type": "NewsArticle",
   "headline": "Council Approves New Transit Budget",
   "datePublished": "2024-02-29T18:45:00+02:00",
   "author": {"@type": "Person", "name": "Sam Writer"},
   "articleSection": "politics"}
  </script>
</head>
<body>
  <div class="article-body">
    <p>The city council approved the transit budget on Thursday after a long debate.</p>
    <p>Supporters said the plan would shorten commutes across the eastern districts.</p>
  </div>
</body>
</html>"#;

pub const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Page not found</title></head>
<body><h1>404</h1><p>The page you requested does not exist.</p></body></html>"#;

/// Soft-404 page some sites return with status 200 for unknown feed paths
pub const SOFT_404_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>Oops</title></head>
<body><p>Nothing to see here, try the homepage instead.</p></body></html>"#;

/// RSS 2.0 feed whose items point at `{base}/news/story-N`
pub fn rss_feed(base: &str, items: usize) -> String {
    let entries: String = (1..=items)
        .map(|i| {
            format!(
                "<item><title>Story {i}</title><link>{base}/news/story-{i}</link>\
                 <guid>{base}/news/story-{i}</guid></item>\n"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>Example News</title>
<link>{base}/</link>
<description>Latest stories</description>
{entries}</channel>
</rss>"#
    )
}

/// Atom feed with relative entry links
pub const RELATIVE_ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Blog</title>
  <id>urn:example:blog</id>
  <updated>2024-03-05T10:00:00Z</updated>
  <entry>
    <title>Launch notes</title>
    <id>urn:example:launch</id>
    <updated>2024-03-05T10:00:00Z</updated>
    <link rel="alternate" href="/blog/launch-notes"/>
  </entry>
</feed>"#;

/// `<urlset>` listing the given URLs
pub fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("  <url><loc>{u}</loc></url>\n"))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{entries}</urlset>"#
    )
}

/// `<sitemapindex>` pointing at the given child sitemaps
pub fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|u| format!("  <sitemap><loc>{u}</loc></sitemap>\n"))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{entries}</sitemapindex>"#
    )
}

/// Homepage advertising one RSS feed through a `<link>` tag
pub fn homepage_with_feed_link(href: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Example News</title>
  <link rel="alternate" type="application/rss+xml" title="Latest" href="{href}">
</head>
<body><h1>Example News</h1></body>
</html>"#
    )
}
