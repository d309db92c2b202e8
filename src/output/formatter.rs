use chrono::NaiveDate;
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::api::types::{LawDetail, LawHistory, SearchItem, SearchResponse};
use crate::cli::OutputFormat;
use crate::error::{Result, WarpError};

pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format search response
    pub fn format_search(&self, response: &SearchResponse) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_search_table(response)),
            OutputFormat::Json => to_json(response),
            OutputFormat::Markdown => Ok(self.format_search_markdown(response)),
            OutputFormat::Csv => self.format_search_csv(response),
        }
    }

    /// Format law detail; CSV falls back to Markdown
    pub fn format_detail(&self, detail: &LawDetail) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_detail_table(detail)),
            OutputFormat::Json => to_json(detail),
            OutputFormat::Markdown | OutputFormat::Csv => Ok(self.format_detail_markdown(detail)),
        }
    }

    /// Format law history
    pub fn format_history(&self, history: &LawHistory) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_history_table(history)),
            OutputFormat::Json => to_json(history),
            OutputFormat::Markdown => Ok(self.format_history_markdown(history)),
            OutputFormat::Csv => self.format_history_csv(history),
        }
    }

    // Table formatting methods
    fn format_search_table(&self, response: &SearchResponse) -> String {
        let merged = has_sources(response);
        let mut table = Table::new();

        let mut header = vec![Cell::new("번호").fg(Color::Cyan)];
        if merged {
            header.push(Cell::new("출처").fg(Color::Cyan));
        }
        header.extend([
            Cell::new("제목").fg(Color::Cyan),
            Cell::new("종류").fg(Color::Cyan),
            Cell::new("소관").fg(Color::Cyan),
            Cell::new("공포일").fg(Color::Cyan),
            Cell::new("시행일").fg(Color::Cyan),
            Cell::new("ID").fg(Color::Cyan),
        ]);
        table.set_header(header);

        for (idx, item) in response.items.iter().enumerate() {
            let mut row = vec![Cell::new(row_number(response, idx))];
            if merged {
                row.push(Cell::new(item.source.as_deref().unwrap_or("-")));
            }
            row.extend([
                Cell::new(truncate_string(&item.title, 40)),
                Cell::new(item.law_type.as_deref().unwrap_or("-")),
                Cell::new(truncate_string(item.department.as_deref().unwrap_or("-"), 20)),
                Cell::new(display_date(item.promulgation_date.as_deref())),
                Cell::new(display_date(item.enforcement_date.as_deref())),
                Cell::new(&item.id),
            ]);
            table.add_row(row);
        }

        table.set_content_arrangement(ContentArrangement::Dynamic);

        let mut result = format!(
            "\n{} Total: {} | Page: {}/{} | Results: {}\n\n",
            "📊".cyan(),
            response.total_count.to_string().yellow(),
            response.page_no.to_string().yellow(),
            page_count(response).to_string().yellow(),
            response.items.len().to_string().yellow()
        );
        result.push_str(&table.to_string());
        result
    }

    fn format_detail_table(&self, detail: &LawDetail) -> String {
        let info = &detail.info;
        let mut result = format!("\n{} {}\n", "📜".cyan(), info.title.bold());
        result.push_str(&"=".repeat(80));
        result.push('\n');

        for (label, value) in summary_fields(info) {
            result.push_str(&format!("{}: {}\n", label, value));
        }
        result.push_str(&"-".repeat(80));
        result.push('\n');

        if detail.articles.is_empty() {
            if !detail.content.is_empty() {
                result.push('\n');
                result.push_str(&detail.content);
                result.push('\n');
            }
        } else {
            result.push_str(&format!(
                "\n{} 조문 ({}개)\n",
                "📋".cyan(),
                detail.articles.len()
            ));
            for article in &detail.articles {
                result.push('\n');
                result.push_str(&article_heading(&article.number, article.title.as_deref()).bold().to_string());
                result.push('\n');
                result.push_str(&article.content);
                result.push('\n');
            }
        }

        if !detail.attachments.is_empty() {
            result.push_str(&format!("\n{} 별표/서식\n", "📎".cyan()));
            for attachment in &detail.attachments {
                match &attachment.url {
                    Some(url) => result.push_str(&format!("- {} ({})\n", attachment.name, url)),
                    None => result.push_str(&format!("- {}\n", attachment.name)),
                }
            }
        }

        if !detail.related_laws.is_empty() {
            result.push_str(&format!("\n{} 관련 법령\n", "🔗".cyan()));
            for related in &detail.related_laws {
                result.push_str(&format!("- [{}] {}\n", related.relation_type, related.title));
            }
        }

        result
    }

    fn format_history_table(&self, history: &LawHistory) -> String {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("순번").fg(Color::Cyan),
            Cell::new("공포일자").fg(Color::Cyan),
            Cell::new("시행일자").fg(Color::Cyan),
            Cell::new("개정구분").fg(Color::Cyan),
            Cell::new("공포번호").fg(Color::Cyan),
            Cell::new("개정이유").fg(Color::Cyan),
        ]);

        for (idx, entry) in history.entries.iter().enumerate() {
            table.add_row(vec![
                Cell::new((idx + 1).to_string()),
                Cell::new(display_date(Some(&entry.promulgation_date))),
                Cell::new(display_date(entry.enforcement_date.as_deref())),
                Cell::new(&entry.revision_type),
                Cell::new(entry.promulgation_no.as_deref().unwrap_or("-")),
                Cell::new(truncate_string(entry.reason.as_deref().unwrap_or("-"), 40)),
            ]);
        }
        table.set_content_arrangement(ContentArrangement::Dynamic);

        let mut result = format!(
            "\n{} {} 개정 연혁 ({}건)\n\n",
            "📜".cyan(),
            history.law_name.bold(),
            history.entries.len()
        );
        result.push_str(&table.to_string());
        result
    }

    // Markdown formatting methods
    fn format_search_markdown(&self, response: &SearchResponse) -> String {
        let merged = has_sources(response);
        let mut result = String::from("# 검색 결과\n\n");
        result.push_str(&format!("- **총 결과**: {}\n", response.total_count));
        result.push_str(&format!(
            "- **페이지**: {}/{}\n",
            response.page_no,
            page_count(response)
        ));
        result.push_str(&format!("- **출처**: {}\n\n", response.source));

        if merged {
            result.push_str("| 번호 | 출처 | 제목 | 종류 | 소관 | 공포일 | ID |\n");
            result.push_str("|------|------|------|------|------|--------|----|\n");
        } else {
            result.push_str("| 번호 | 제목 | 종류 | 소관 | 공포일 | ID |\n");
            result.push_str("|------|------|------|------|--------|----|\n");
        }

        for (idx, item) in response.items.iter().enumerate() {
            let source = if merged {
                format!(" {} |", item.source.as_deref().unwrap_or("-"))
            } else {
                String::new()
            };
            result.push_str(&format!(
                "| {} |{} {} | {} | {} | {} | {} |\n",
                row_number(response, idx),
                source,
                escape_markdown(&item.title),
                item.law_type.as_deref().unwrap_or("-"),
                escape_markdown(item.department.as_deref().unwrap_or("-")),
                display_date(item.promulgation_date.as_deref()),
                item.id,
            ));
        }

        result
    }

    fn format_detail_markdown(&self, detail: &LawDetail) -> String {
        let mut result = format!("# {}\n\n", detail.info.title);
        for (label, value) in summary_fields(&detail.info) {
            result.push_str(&format!("- **{}**: {}\n", label, value));
        }
        result.push_str("\n---\n\n");

        if detail.articles.is_empty() {
            result.push_str(&detail.content);
            result.push('\n');
        } else {
            result.push_str("## 조문\n\n");
            for article in &detail.articles {
                result.push_str(&format!(
                    "### {}\n\n{}\n\n",
                    article_heading(&article.number, article.title.as_deref()),
                    article.content
                ));
            }
        }

        if !detail.related_laws.is_empty() {
            result.push_str("\n## 관련 법령\n\n");
            for related in &detail.related_laws {
                result.push_str(&format!("- {} ({})\n", related.title, related.relation_type));
            }
        }

        result
    }

    fn format_history_markdown(&self, history: &LawHistory) -> String {
        let mut result = format!("# {} 개정 연혁\n\n", history.law_name);
        result.push_str(&format!("총 {}건의 개정 이력\n\n", history.entries.len()));
        result.push_str("| 순번 | 공포일자 | 시행일자 | 개정구분 | 개정이유 |\n");
        result.push_str("|------|----------|----------|----------|----------|\n");

        for (idx, entry) in history.entries.iter().enumerate() {
            result.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                idx + 1,
                display_date(Some(&entry.promulgation_date)),
                display_date(entry.enforcement_date.as_deref()),
                entry.revision_type,
                escape_markdown(entry.reason.as_deref().unwrap_or("-")),
            ));
        }

        result
    }

    // CSV formatting
    fn format_search_csv(&self, response: &SearchResponse) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(["id", "title", "law_type", "department", "promulgation_date", "enforcement_date", "source"])
            .map_err(csv_error)?;

        for item in &response.items {
            wtr.write_record([
                item.id.as_str(),
                item.title.as_str(),
                item.law_type.as_deref().unwrap_or(""),
                item.department.as_deref().unwrap_or(""),
                item.promulgation_date.as_deref().unwrap_or(""),
                item.enforcement_date.as_deref().unwrap_or(""),
                item.source.as_deref().unwrap_or(response.source.as_str()),
            ])
            .map_err(csv_error)?;
        }

        finish_csv(wtr)
    }

    fn format_history_csv(&self, history: &LawHistory) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(["promulgation_date", "enforcement_date", "revision_type", "promulgation_no", "reason"])
            .map_err(csv_error)?;

        for entry in &history.entries {
            wtr.write_record([
                entry.promulgation_date.as_str(),
                entry.enforcement_date.as_deref().unwrap_or(""),
                entry.revision_type.as_str(),
                entry.promulgation_no.as_deref().unwrap_or(""),
                entry.reason.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
        }

        finish_csv(wtr)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(WarpError::Serialization)
}

fn csv_error(e: csv::Error) -> WarpError {
    WarpError::Other(format!("CSV output failed: {}", e))
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| WarpError::Other(format!("CSV output failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| WarpError::Other(format!("CSV output failed: {}", e)))
}

fn has_sources(response: &SearchResponse) -> bool {
    response.items.iter().any(|item| item.source.is_some())
}

fn row_number(response: &SearchResponse, idx: usize) -> String {
    let offset = u64::from(response.page_no.saturating_sub(1)) * u64::from(response.page_size);
    (offset + idx as u64 + 1).to_string()
}

fn page_count(response: &SearchResponse) -> u32 {
    if response.page_size == 0 {
        return 0;
    }
    response.total_count.div_ceil(response.page_size)
}

fn summary_fields(info: &SearchItem) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(law_type) = &info.law_type {
        fields.push(("종류", law_type.clone()));
    }
    if let Some(department) = &info.department {
        fields.push(("소관", department.clone()));
    }
    if info.promulgation_date.is_some() || info.promulgation_no.is_some() {
        let date = display_date(info.promulgation_date.as_deref());
        let number = info
            .promulgation_no
            .as_deref()
            .map(|no| format!(" (제{}호)", no.trim_start_matches('제').trim_end_matches('호')))
            .unwrap_or_default();
        fields.push(("공포", format!("{}{}", date, number)));
    }
    if let Some(date) = &info.enforcement_date {
        fields.push(("시행일자", display_date(Some(date))));
    }
    fields.push(("ID", info.id.clone()));
    fields
}

fn article_heading(number: &str, title: Option<&str>) -> String {
    let number = if number.is_empty() || number.starts_with('제') {
        number.to_string()
    } else {
        format!("제{}조", number)
    };
    match title {
        Some(title) => format!("{}({})", number, title),
        None => number,
    }
}

/// `YYYYMMDD` (or `YYYY.MM.DD`) as `YYYY-MM-DD`; anything else unchanged
pub fn display_date(date: Option<&str>) -> String {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return "-".to_string();
    };
    ["%Y%m%d", "%Y.%m.%d", "%Y.%m.%d."]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| date.to_string())
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('*', "\\*").replace('_', "\\_")
}
