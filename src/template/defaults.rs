const PAGE_HEAD: &str = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN"
   "http://www.w3.org/TR/html4/strict.dtd">
<html lang="en">
<head>
    <meta http-equiv="Content-Type" content="text/html; charset=UTF-8">
"#;

const PAGE_BODY: &str = r#"    <link rel="stylesheet" href="style.css" type="text/css">
    <title>rawdog</title>
</head>
<body id="rawdog">
<div id="header">
<h1>rawdog</h1>
</div>
<div id="items">
__items__
</div>
"#;

const PAGE_FEEDS: &str = r#"<h2 id="feedstatsheader">Feeds</h2>
<div id="feedstats">
__feeds__
</div>
"#;

const PAGE_FOOTER: &str = r#"<div id="footer">
<p id="aboutrawdog">Generated by rawdog version __version__.</p>
</div>
</body>
</html>"#;

const ITEM: &str = r#"<div class="item feed-__feed_hash__" id="item-__hash__">
<p class="itemheader">
<span class="itemtitle">__title__</span>
<span class="itemfrom">[__feed_title__]</span>
</p>
__if_description__<div class="itemdescription">
<p>__description__</p>
</div>__endif__
</div>

"#;

/// The built-in page template. The refresh header and the feed table are
/// only part of it when enabled.
pub fn default_page_template(use_refresh: bool, show_feeds: bool) -> String {
    let mut template = String::from(PAGE_HEAD);
    if use_refresh {
        template.push_str("__refresh__\n");
    }
    template.push_str(PAGE_BODY);
    if show_feeds {
        template.push_str(PAGE_FEEDS);
    }
    template.push_str(PAGE_FOOTER);
    template
}

pub fn default_item_template() -> String {
    ITEM.to_string()
}
