// Member operations that go beyond a plain controller passthrough.

use serde_json::{Map, Value, json};
use tracing::info;

use ztadmin_api::Member;

use crate::backend::Backend;
use crate::error::CoreError;
use crate::names::MemberNames;

/// Assign `ip` to a member. Already-assigned addresses are left alone and
/// the member is returned unchanged.
pub async fn add_member_ip(
    backend: &Backend,
    nwid: &str,
    member_id: &str,
    ip: &str,
) -> Result<Member, CoreError> {
    let ip = ip.trim();
    if ip.is_empty() {
        return Err(CoreError::validation("IP address is required"));
    }
    let member = backend.require_member(nwid, member_id).await?;
    if member.ip_assignments.iter().any(|assigned| assigned == ip) {
        return Ok(member);
    }

    let mut ips = member.ip_assignments;
    ips.push(ip.to_owned());
    info!(nwid, member_id, ip, "assigning member IP");
    backend
        .update_member(nwid, member_id, &json!({ "ipAssignments": ips }))
        .await
}

/// Remove `ip` from a member's assignments.
pub async fn remove_member_ip(
    backend: &Backend,
    nwid: &str,
    member_id: &str,
    ip: &str,
) -> Result<Member, CoreError> {
    let member = backend.require_member(nwid, member_id).await?;
    let ips: Vec<String> = member
        .ip_assignments
        .into_iter()
        .filter(|assigned| assigned != ip.trim())
        .collect();
    info!(nwid, member_id, ip, "removing member IP");
    backend
        .update_member(nwid, member_id, &json!({ "ipAssignments": ips }))
        .await
}

/// Store a local display name. The controller is not contacted.
pub async fn rename_member(
    names: &MemberNames,
    member_id: &str,
    name: &str,
) -> Result<(), CoreError> {
    names.set(member_id, name).await?;
    info!(member_id, "member renamed");
    Ok(())
}

/// Delete a member from the controller and forget its display name.
pub async fn delete_member(
    backend: &Backend,
    names: &MemberNames,
    nwid: &str,
    member_id: &str,
) -> Result<(), CoreError> {
    backend.delete_member(nwid, member_id).await?;
    names.remove(member_id).await?;
    info!(nwid, member_id, "member deleted");
    Ok(())
}

/// A dashboard member edit.
///
/// `addIP` and `removeIP` are handled on their own and take precedence.
/// Otherwise `name` goes to the local name store and every remaining field
/// is forwarded to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberEdit {
    AddIp(String),
    RemoveIp(String),
    Fields {
        name: Option<String>,
        patch: Map<String, Value>,
    },
}

impl MemberEdit {
    pub fn from_body(body: Value) -> Result<Self, CoreError> {
        let Value::Object(mut body) = body else {
            return Err(CoreError::validation("member update must be a JSON object"));
        };

        if let Some(ip) = non_empty_str(body.get("addIP")) {
            return Ok(Self::AddIp(ip));
        }
        if let Some(ip) = non_empty_str(body.get("removeIP")) {
            return Ok(Self::RemoveIp(ip));
        }

        body.remove("addIP");
        body.remove("removeIP");
        let name = match body.remove("name") {
            None => None,
            Some(Value::Null) => Some(String::new()),
            Some(Value::String(name)) => Some(name),
            Some(_) => return Err(CoreError::validation("name must be a string")),
        };
        Ok(Self::Fields { name, patch: body })
    }

    /// Apply the edit. `None` means only the local name changed.
    pub async fn apply(
        self,
        backend: &Backend,
        names: &MemberNames,
        nwid: &str,
        member_id: &str,
    ) -> Result<Option<Member>, CoreError> {
        match self {
            Self::AddIp(ip) => add_member_ip(backend, nwid, member_id, &ip).await.map(Some),
            Self::RemoveIp(ip) => remove_member_ip(backend, nwid, member_id, &ip)
                .await
                .map(Some),
            Self::Fields { name, patch } => {
                if let Some(name) = name {
                    rename_member(names, member_id, &name).await?;
                }
                if patch.is_empty() {
                    return Ok(None);
                }
                let member = backend
                    .update_member(nwid, member_id, &Value::Object(patch))
                    .await?;
                Ok(Some(member))
            }
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn add_ip_takes_precedence() {
        let edit = MemberEdit::from_body(json!({
            "addIP": "10.0.0.5",
            "name": "ignored",
            "authorized": true,
        }))
        .unwrap();
        assert_eq!(edit, MemberEdit::AddIp("10.0.0.5".into()));
    }

    #[test]
    fn name_is_split_from_controller_fields() {
        let edit = MemberEdit::from_body(json!({"name": "laptop", "authorized": true})).unwrap();
        let MemberEdit::Fields { name, patch } = edit else {
            panic!("expected field edit");
        };
        assert_eq!(name.as_deref(), Some("laptop"));
        assert_eq!(Value::Object(patch), json!({"authorized": true}));
    }

    #[test]
    fn empty_add_ip_falls_through_to_fields() {
        let edit = MemberEdit::from_body(json!({"addIP": "", "activeBridge": true})).unwrap();
        assert_eq!(edit, MemberEdit::Fields {
            name: None,
            patch: json!({"activeBridge": true})
                .as_object()
                .cloned()
                .unwrap(),
        });
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = MemberEdit::from_body(json!(["authorized"])).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }
}
