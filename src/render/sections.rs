use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::config::Config;

/// Writes the day and time headings that group articles on the page. Feed it
/// each article's timestamp in output order; it opens a new section whenever
/// the calendar day or the exact second changes.
pub struct DayWriter<'a> {
    day_format: &'a str,
    time_format: &'a str,
    day_sections: bool,
    time_sections: bool,
    last: Option<(NaiveDate, i64)>,
    open: usize,
}

impl<'a> DayWriter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            day_format: &config.day_format,
            time_format: &config.time_format,
            day_sections: config.day_sections,
            time_sections: config.time_sections,
            last: None,
            open: 0,
        }
    }

    pub fn time<Tz>(&mut self, out: &mut String, when: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let day = when.date_naive();
        let second = when.timestamp();
        let (new_day, new_second) = match self.last {
            Some((last_day, last_second)) => (day != last_day, second != last_second),
            None => (true, true),
        };

        if new_day && self.day_sections {
            self.close(out, 0);
            out.push_str("<div class=\"day\">\n");
            out.push_str(&format!("<h2>{}</h2>\n", when.format(self.day_format)));
            self.open += 1;
        }
        if new_second && self.time_sections {
            self.close(out, usize::from(self.day_sections));
            out.push_str("<div class=\"time\">\n");
            out.push_str(&format!("<h3>{}</h3>\n", when.format(self.time_format)));
            self.open += 1;
        }

        self.last = Some((day, second));
    }

    /// Close open sections until only `keep` remain.
    pub fn close(&mut self, out: &mut String, keep: usize) {
        while self.open > keep {
            out.push_str("</div>\n");
            self.open -= 1;
        }
    }
}
