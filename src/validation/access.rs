use crate::models::{Caller, MarketItem, Role, Studio};

pub fn is_authenticated(caller: Option<&Caller>) -> bool {
    caller.is_some_and(|caller| !caller.uid.is_empty())
}

/// Caller is the user identified by `user_id`
pub fn is_owner(caller: Option<&Caller>, user_id: &str) -> bool {
    is_authenticated(caller) && caller.is_some_and(|caller| caller.uid == user_id)
}

pub fn is_admin(caller: Option<&Caller>) -> bool {
    is_authenticated(caller) && caller.is_some_and(|caller| caller.role == Role::Admin)
}

pub fn is_item_owner(caller: Option<&Caller>, item: &MarketItem) -> bool {
    is_owner(caller, &item.seller_id)
}

pub fn is_studio_owner(caller: Option<&Caller>, studio: &Studio) -> bool {
    is_owner(caller, &studio.owner_id)
}

/// Sellers manage their own listings; admins manage everyone's
pub fn can_modify_item(caller: Option<&Caller>, item: &MarketItem) -> bool {
    is_item_owner(caller, item) || is_admin(caller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_caller_has_no_rights() {
        assert!(!is_authenticated(None));
        assert!(!is_owner(None, "u1"));
        assert!(!is_admin(None));
        assert!(!is_authenticated(Some(&Caller::user(""))));
        assert!(!is_owner(Some(&Caller::user("")), ""));
    }

    #[test]
    fn ownership_and_roles() {
        let user = Caller::user("u1");
        let admin = Caller::admin("root");
        assert!(is_owner(Some(&user), "u1"));
        assert!(!is_owner(Some(&user), "u2"));
        assert!(!is_admin(Some(&user)));
        assert!(is_admin(Some(&admin)));
        assert!(!is_owner(Some(&admin), "u1"));
    }
}
