//! Email subscription to the alert topic.

use anyhow::{bail, Result};

use crate::aws::sns::SnsClient;
use crate::aws::AwsContext;
use crate::record::DeploymentRecord;

/// Cheap plausibility check; SNS does the real validation on its side.
fn looks_like_email(address: &str) -> bool {
    let address = address.trim();
    !address.is_empty() && address.contains('@')
}

/// Subscribe an email address to the recorded alert topic.
pub async fn run_subscribe(
    ctx: &AwsContext,
    record: &DeploymentRecord,
    email: &str,
) -> Result<()> {
    let email = email.trim();
    if !looks_like_email(email) {
        bail!("'{email}' does not look like an email address");
    }

    let sns = SnsClient::from_context(ctx);
    sns.subscribe_email(&record.sns_topic_arn, email).await?;

    println!("Confirmation email sent to {email}.");
    println!("Alerts begin once the link inside it is clicked.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plausible_addresses_pass() {
        assert!(looks_like_email("ops@example.com"));
        assert!(looks_like_email("  padded@example.com  "));
    }

    #[test]
    fn implausible_addresses_fail() {
        assert!(!looks_like_email("not-an-email"));
        assert!(!looks_like_email(""));
        assert!(!looks_like_email("   "));
    }
}
