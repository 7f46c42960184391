//! SNS topic and email subscription handling.
//!
//! ListTopics only returns ARNs, so all topic discovery is substring
//! matching against the ARN tail. Email subscribers stay in
//! PendingConfirmation until the recipient clicks the link AWS mails them;
//! pending subscriptions cannot be unsubscribed, only expired.

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::context::AwsContext;
use super::error::is_not_found;
use crate::discovery::NameMatch;

/// Result of [`SnsClient::ensure_topic`].
pub struct EnsuredTopic {
    pub arn: String,
    /// Whether this call created the topic.
    pub created: bool,
}

/// Subscription counts for the validation report.
pub struct TopicSummary {
    pub confirmed: usize,
    pub pending: usize,
}

fn is_confirmed(subscription_arn: &str) -> bool {
    subscription_arn.starts_with("arn:")
}

pub struct SnsClient {
    client: aws_sdk_sns::Client,
}

impl SnsClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sns_client(),
        }
    }

    /// ARNs of every topic the matcher accepts. Matching runs against the
    /// full ARN; topic names sit at its end.
    pub async fn topics_matching(&self, matcher: &NameMatch) -> Result<Vec<String>> {
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .client
                .list_topics()
                .set_next_token(next_token.take())
                .send()
                .await
                .context("Failed to list topics")?;
            for topic in page.topics() {
                if let Some(arn) = topic.topic_arn() {
                    if matcher.matches(arn) {
                        arns.push(arn.to_string());
                    }
                }
            }
            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(arns),
            }
        }
    }

    /// Create the topic unless one matching its name already exists.
    pub async fn ensure_topic(&self, name: &str) -> Result<EnsuredTopic> {
        let existing = self.topics_matching(&NameMatch::contains(name)).await?;
        if let Some(arn) = existing.into_iter().next() {
            info!(topic = %arn, "Topic already exists, reusing");
            return Ok(EnsuredTopic {
                arn,
                created: false,
            });
        }

        let created = self
            .client
            .create_topic()
            .name(name)
            .send()
            .await
            .with_context(|| format!("Failed to create topic {name}"))?;
        let arn = created
            .topic_arn()
            .map(str::to_string)
            .with_context(|| format!("CreateTopic returned no ARN for {name}"))?;
        info!(topic = %arn, "Topic created");
        Ok(EnsuredTopic { arn, created: true })
    }

    /// Whether the topic still exists.
    pub async fn topic_exists(&self, arn: &str) -> Result<bool> {
        match self
            .client
            .get_topic_attributes()
            .topic_arn(arn)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to describe topic {arn}")),
        }
    }

    /// Subscribe an email address. The subscription stays pending until the
    /// recipient confirms it.
    pub async fn subscribe_email(&self, topic_arn: &str, email: &str) -> Result<()> {
        self.client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol("email")
            .endpoint(email)
            .send()
            .await
            .with_context(|| format!("Failed to subscribe {email}"))?;
        info!(%email, topic = %topic_arn, "Confirmation email sent");
        Ok(())
    }

    /// Count confirmed and pending subscriptions on the topic.
    pub async fn subscription_summary(&self, topic_arn: &str) -> Result<TopicSummary> {
        let mut summary = TopicSummary {
            confirmed: 0,
            pending: 0,
        };
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .client
                .list_subscriptions_by_topic()
                .topic_arn(topic_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .with_context(|| format!("Failed to list subscriptions of {topic_arn}"))?;
            for subscription in page.subscriptions() {
                match subscription.subscription_arn() {
                    Some(arn) if is_confirmed(arn) => summary.confirmed += 1,
                    _ => summary.pending += 1,
                }
            }
            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(summary),
            }
        }
    }

    /// Unsubscribe every confirmed subscriber, then delete the topic.
    /// Returns false when the topic was already gone.
    pub async fn delete_topic_with_subscriptions(&self, topic_arn: &str) -> Result<bool> {
        let mut next_token: Option<String> = None;
        loop {
            let page = match self
                .client
                .list_subscriptions_by_topic()
                .topic_arn(topic_arn)
                .set_next_token(next_token.take())
                .send()
                .await
            {
                Ok(page) => page,
                Err(err) if is_not_found(&err) => return Ok(false),
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to list subscriptions of {topic_arn}"))
                }
            };
            for subscription in page.subscriptions() {
                let Some(arn) = subscription.subscription_arn() else {
                    continue;
                };
                if !is_confirmed(arn) {
                    // Pending confirmations cannot be unsubscribed; they
                    // expire on their own after three days.
                    continue;
                }
                if let Err(err) = self
                    .client
                    .unsubscribe()
                    .subscription_arn(arn)
                    .send()
                    .await
                {
                    warn!(subscription = %arn, error = %err, "Failed to unsubscribe, continuing");
                }
            }
            match page.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        match self.client.delete_topic().topic_arn(topic_arn).send().await {
            Ok(_) => {
                info!(topic = %topic_arn, "Topic deleted");
                Ok(true)
            }
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to delete topic {topic_arn}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_real_arns_count_as_confirmed() {
        assert!(is_confirmed(
            "arn:aws:sns:us-east-1:123456789012:low-stock-inventory-main:deadbeef"
        ));
        assert!(!is_confirmed("PendingConfirmation"));
        assert!(!is_confirmed("Deleted"));
    }
}
