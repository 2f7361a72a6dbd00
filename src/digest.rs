use crate::error::Result;
use crate::page::Page;
use crate::results::PageRecord;

/// Paragraphs included in [`Page::overview`]
pub const OVERVIEW_PARAGRAPHS: usize = 3;

impl Page {
    /// Flat record of every extracted field plus the raw body
    pub fn to_record(&self) -> Result<PageRecord> {
        Ok(PageRecord {
            url: self.url().to_string(),
            site_name: self.site_name()?.map(str::to_string),
            titles: self.titles()?.to_vec(),
            descriptions: self.descriptions()?.to_vec(),
            authors: self.authors()?.to_vec(),
            content_type: self.content_type_label()?.map(str::to_string),
            open_graph: self.open_graph()?.clone(),
            meta_tags: self.meta_tags()?.clone(),
            headings: self.headings()?.to_vec(),
            paragraphs: self.paragraphs()?.to_vec(),
            resolved_url: self.resolved_url()?.map(str::to_string),
            feeds: self.feeds()?.to_vec(),
            published_at: self.published_dates()?.to_vec(),
            html: self.html()?.to_string(),
        })
    }

    /// Human-readable summary, one labelled line per value
    pub fn overview(&self) -> Result<String> {
        let mut lines = vec![format!("URL: {}", self.url())];

        if let Some(site_name) = self.site_name()? {
            lines.push(format!("SITE NAME: {site_name}"));
        }
        labelled(&mut lines, "POSSIBLE TITLE", self.titles()?);
        labelled(&mut lines, "POSSIBLE DESCRIPTION", self.descriptions()?);
        labelled(&mut lines, "POSSIBLE AUTHOR", self.authors()?);
        labelled(&mut lines, "POSSIBLE DATE", self.published_dates()?);
        labelled(&mut lines, "HEADING", self.headings()?);

        for (index, paragraph) in self
            .paragraphs()?
            .iter()
            .take(OVERVIEW_PARAGRAPHS)
            .enumerate()
        {
            lines.push(format!("PARAGRAPH {}: {}", index + 1, paragraph));
        }

        Ok(lines.join("\n"))
    }
}

fn labelled(lines: &mut Vec<String>, label: &str, values: &[String]) {
    lines.extend(values.iter().map(|value| format!("{label}: {value}")));
}
