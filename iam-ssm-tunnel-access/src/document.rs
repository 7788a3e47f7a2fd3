//! The fixed SSM tunnel access policy document.
//!
//! The permission statements are an externally supplied template; the
//! reconciliation core treats the document as opaque JSON.

use serde_json::{json, Value};

/// Policy document granting SSM Session Manager port-forwarding access.
#[must_use]
pub fn tunnel_policy_document() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "StartTunnelSession",
                "Effect": "Allow",
                "Action": ["ssm:StartSession"],
                "Resource": [
                    "arn:aws:ec2:*:*:instance/*",
                    "arn:aws:ssm:*:*:document/AWS-StartPortForwardingSession",
                    "arn:aws:ssm:*:*:document/AWS-StartPortForwardingSessionToRemoteHost"
                ]
            },
            {
                "Sid": "ManageOwnSessions",
                "Effect": "Allow",
                "Action": ["ssm:TerminateSession", "ssm:ResumeSession"],
                "Resource": ["arn:aws:ssm:*:*:session/${aws:username}-*"]
            },
            {
                "Sid": "DescribeSessions",
                "Effect": "Allow",
                "Action": ["ssm:DescribeSessions", "ssm:GetConnectionStatus"],
                "Resource": "*"
            }
        ]
    })
}
