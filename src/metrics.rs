/// Prometheus metrics for the site backend.
///
/// Counters are registered without the `_total` suffix; the text encoder
/// appends it.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use strum::AsRefStr;

use crate::blog::{BlogPost, PostStatus};
use crate::catalog::OfferingKind;

pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    /// Matched route template, e.g. `/blog/{slug}`
    pub route: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub route: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct KindLabels {
    pub kind: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusLabels {
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ContactOutcome {
    Sent,
    Invalid,
    RateLimited,
    MailFailed,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    pub http_requests_total: Family<HttpLabels, Counter>,
    pub http_request_duration_seconds: Family<RouteLabels, Histogram>,
    pub contact_submissions_total: Family<OutcomeLabels, Counter>,
    pub rate_limit_rejections_total: Counter,
    /// Landing pages in the SEO matrix, by offering kind
    pub seo_pages_total: Family<KindLabels, Gauge>,
    pub blog_posts_total: Family<StatusLabels, Gauge>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total number of HTTP requests by route and status",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<RouteLabels, Histogram>::new_with_constructor(|| {
                // 5ms .. ~10s
                Histogram::new(exponential_buckets(0.005, 2.5, 9))
            });
        registry.register(
            "http_request_duration_seconds",
            "Request latency histogram in seconds",
            http_request_duration_seconds.clone(),
        );

        let contact_submissions_total = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "contact_submissions",
            "Contact form submissions by outcome",
            contact_submissions_total.clone(),
        );

        let rate_limit_rejections_total = Counter::default();
        registry.register(
            "rate_limit_rejections",
            "Contact submissions rejected by the rate limiter",
            rate_limit_rejections_total.clone(),
        );

        let seo_pages_total = Family::<KindLabels, Gauge>::default();
        registry.register(
            "seo_pages_total",
            "Generated city landing pages by kind",
            seo_pages_total.clone(),
        );

        let blog_posts_total = Family::<StatusLabels, Gauge>::default();
        registry.register(
            "blog_posts_total",
            "Blog posts by status",
            blog_posts_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            http_requests_total,
            http_request_duration_seconds,
            contact_submissions_total,
            rate_limit_rejections_total,
            seo_pages_total,
            blog_posts_total,
        }
    }

    /// Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        if let Err(error) = encode(&mut buffer, &registry) {
            tracing::error!(%error, "failed to encode metrics");
        }
        buffer
    }

    pub fn record_http_request(&self, route: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .get_or_create(&HttpLabels {
                route: route.to_string(),
                status: status.to_string(),
            })
            .inc();

        self.http_request_duration_seconds
            .get_or_create(&RouteLabels {
                route: route.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    pub fn record_contact_submission(&self, outcome: ContactOutcome) {
        self.contact_submissions_total
            .get_or_create(&OutcomeLabels {
                outcome: outcome.as_ref().to_string(),
            })
            .inc();
        if outcome == ContactOutcome::RateLimited {
            self.rate_limit_rejections_total.inc();
        }
    }

    pub fn set_seo_pages(&self, kind: OfferingKind, count: usize) {
        self.seo_pages_total
            .get_or_create(&KindLabels {
                kind: kind.as_ref().to_string(),
            })
            .set(count as i64);
    }

    /// Recounts posts per status.
    pub fn update_blog_posts(&self, posts: &[BlogPost]) {
        for status in [PostStatus::Draft, PostStatus::Published] {
            let count = posts.iter().filter(|p| p.status == status).count();
            self.blog_posts_total
                .get_or_create(&StatusLabels {
                    status: status.to_string(),
                })
                .set(count as i64);
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_metrics() {
        let collector = MetricsCollector::new();
        collector.record_http_request("/blog/{slug}", 200, Duration::from_millis(12));
        collector.record_http_request("/blog/{slug}", 404, Duration::from_millis(3));

        let output = collector.encode();
        assert!(output.contains("http_requests_total{route=\"/blog/{slug}\",status=\"200\"} 1"));
        assert!(output.contains("http_requests_total{route=\"/blog/{slug}\",status=\"404\"} 1"));
        assert!(output.contains("http_request_duration_seconds_count{route=\"/blog/{slug}\"} 2"));
    }

    #[test]
    fn test_rate_limited_contact_counts_rejection() {
        let collector = MetricsCollector::new();
        collector.record_contact_submission(ContactOutcome::Sent);
        collector.record_contact_submission(ContactOutcome::RateLimited);
        collector.record_contact_submission(ContactOutcome::RateLimited);

        let output = collector.encode();
        assert!(output.contains("contact_submissions_total{outcome=\"sent\"} 1"));
        assert!(output.contains("contact_submissions_total{outcome=\"rate_limited\"} 2"));
        assert!(output.contains("rate_limit_rejections_total 2"));
    }

    #[test]
    fn test_seo_page_gauge() {
        let collector = MetricsCollector::new();
        collector.set_seo_pages(OfferingKind::Product, 80);
        collector.set_seo_pages(OfferingKind::Service, 40);

        let output = collector.encode();
        assert!(output.contains("seo_pages_total{kind=\"product\"} 80"));
        assert!(output.contains("seo_pages_total{kind=\"service\"} 40"));
    }

    #[test]
    fn test_blog_posts_gauge_with_no_posts() {
        let collector = MetricsCollector::new();
        collector.update_blog_posts(&[]);

        let output = collector.encode();
        assert!(output.contains("blog_posts_total{status=\"draft\"} 0"));
        assert!(output.contains("blog_posts_total{status=\"published\"} 0"));
    }
}
