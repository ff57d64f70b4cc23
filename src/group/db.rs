//! Database operations for groups and memberships.

use rusqlite::{Connection, Row, Transaction as SqlTransaction};

use crate::{
    Error,
    group::domain::{Group, GroupId, InviteCode, Member, MemberRole, TripName},
    user::UserId,
};

/// Initialize the group and membership tables.
pub fn create_group_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS trip_group (
            id INTEGER PRIMARY KEY,
            trip_name TEXT NOT NULL,
            total_budget REAL NOT NULL,
            invite_code TEXT NOT NULL UNIQUE,
            created_by INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            custom_categories TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY(created_by) REFERENCES user(id)
        );

        CREATE INDEX IF NOT EXISTS idx_trip_group_invite_code ON trip_group(invite_code);

        CREATE TABLE IF NOT EXISTS membership (
            id INTEGER PRIMARY KEY,
            group_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            joined_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(group_id, user_id),
            FOREIGN KEY(group_id) REFERENCES trip_group(id),
            FOREIGN KEY(user_id) REFERENCES user(id)
        );",
    )?;

    Ok(())
}

/// Create a group and its creator's admin membership in one transaction.
///
/// The creator becomes the group admin and its sole initial member.
///
/// # Errors
///
/// Returns [Error::DuplicateInviteCode] in the unlikely case the generated
/// code is already taken, or [Error::SqlError] for other SQL errors.
pub fn create_group(
    trip_name: TripName,
    total_budget: f64,
    created_by: UserId,
    connection: &Connection,
) -> Result<Group, Error> {
    let invite_code = InviteCode::generate();

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Immediate)?;

    transaction.execute(
        "INSERT INTO trip_group (trip_name, total_budget, invite_code, created_by)
         VALUES (?1, ?2, ?3, ?4)",
        (
            trip_name.as_ref(),
            total_budget,
            invite_code.as_ref(),
            created_by.as_i64(),
        ),
    )?;

    let group_id = transaction.last_insert_rowid();

    transaction.execute(
        "INSERT INTO membership (group_id, user_id, role) VALUES (?1, ?2, ?3)",
        (group_id, created_by.as_i64(), MemberRole::Admin.as_str()),
    )?;

    transaction.commit()?;

    Ok(Group {
        id: group_id,
        trip_name,
        total_budget,
        invite_code,
        created_by,
        is_active: true,
        custom_categories: Vec::new(),
    })
}

const GROUP_COLUMNS: &str =
    "id, trip_name, total_budget, invite_code, created_by, is_active, custom_categories";

/// Retrieve a single group by ID.
///
/// # Errors
///
/// Returns [Error::GroupNotFound] if `group_id` does not refer to a group.
pub fn get_group(group_id: GroupId, connection: &Connection) -> Result<Group, Error> {
    connection
        .prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM trip_group WHERE id = :id"
        ))?
        .query_row(&[(":id", &group_id)], map_group_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::GroupNotFound,
            error => error,
        })
}

/// Retrieve a group by its invite code.
///
/// The caller should normalize the code with [InviteCode::parse] first.
///
/// # Errors
///
/// Returns [Error::GroupNotFound] if no group has this code.
pub fn get_group_by_invite_code(
    invite_code: &InviteCode,
    connection: &Connection,
) -> Result<Group, Error> {
    connection
        .prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM trip_group WHERE invite_code = :invite_code"
        ))?
        .query_row(&[(":invite_code", &invite_code.as_ref())], map_group_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::GroupNotFound,
            error => error,
        })
}

/// Retrieve the groups that `user_id` belongs to, newest first.
pub fn get_user_groups(user_id: UserId, connection: &Connection) -> Result<Vec<Group>, Error> {
    connection
        .prepare(&format!(
            "SELECT {} FROM trip_group
             JOIN membership ON membership.group_id = trip_group.id
             WHERE membership.user_id = :user_id
             ORDER BY trip_group.created_at DESC, trip_group.id DESC",
            GROUP_COLUMNS
                .split(", ")
                .map(|column| format!("trip_group.{column}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_group_row)?
        .map(|maybe_group| maybe_group.map_err(|error| error.into()))
        .collect()
}

/// Add `user_id` to a group as a regular member.
///
/// # Errors
///
/// Returns [Error::AlreadyMember] if the user already belongs to the group.
pub fn join_group(
    group_id: GroupId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO membership (group_id, user_id, role) VALUES (?1, ?2, ?3)",
        (group_id, user_id.as_i64(), MemberRole::Member.as_str()),
    )?;

    Ok(())
}

/// Retrieve a group's members with their profile fields, admin first.
pub fn get_members(group_id: GroupId, connection: &Connection) -> Result<Vec<Member>, Error> {
    connection
        .prepare(
            "SELECT membership.user_id, user.full_name, user.email, membership.role
             FROM membership
             JOIN user ON user.id = membership.user_id
             WHERE membership.group_id = :group_id
             ORDER BY membership.role ASC, membership.joined_at ASC",
        )?
        .query_map(&[(":group_id", &group_id)], |row| {
            let raw_role: String = row.get(3)?;

            Ok(Member {
                user_id: UserId::new(row.get(0)?),
                full_name: row.get(1)?,
                email: row.get(2)?,
                role: MemberRole::parse(&raw_role).unwrap_or(MemberRole::Member),
            })
        })?
        .map(|maybe_member| maybe_member.map_err(|error| error.into()))
        .collect()
}

/// Get the role `user_id` holds in `group_id`.
///
/// # Errors
///
/// Returns [Error::NotGroupMember] if the user does not belong to the group.
pub fn get_membership_role(
    group_id: GroupId,
    user_id: UserId,
    connection: &Connection,
) -> Result<MemberRole, Error> {
    connection
        .prepare(
            "SELECT role FROM membership WHERE group_id = :group_id AND user_id = :user_id",
        )?
        .query_row(
            &[(":group_id", &group_id), (":user_id", &user_id.as_i64())],
            |row| {
                let raw_role: String = row.get(0)?;
                Ok(MemberRole::parse(&raw_role).unwrap_or(MemberRole::Member))
            },
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::NotGroupMember,
            error => error,
        })
}

/// Change a group's total budget.
///
/// Whole-value overwrite: the last write wins, there is no version check.
///
/// # Errors
///
/// Returns [Error::GroupNotFound] if the group does not exist.
pub fn update_budget(
    group_id: GroupId,
    total_budget: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE trip_group SET total_budget = ?1 WHERE id = ?2",
        (total_budget, group_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::GroupNotFound);
    }

    Ok(())
}

/// Register `category` in the group's custom category list if it is new.
///
/// Categories already in the list are left untouched, so calling this for an
/// existing category is a no-op.
pub fn add_custom_category(
    group_id: GroupId,
    category: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let group = get_group(group_id, connection)?;

    if group
        .categories()
        .iter()
        .any(|existing| existing == category)
    {
        return Ok(());
    }

    let mut custom_categories = group.custom_categories;
    custom_categories.push(category.to_string());

    let serialized = serde_json::to_string(&custom_categories)
        .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    connection.execute(
        "UPDATE trip_group SET custom_categories = ?1 WHERE id = ?2",
        (serialized, group_id),
    )?;

    Ok(())
}

/// Delete a group along with its expenses, saved filters and memberships.
///
/// Runs inside a single transaction so a failure never leaves a partial
/// cascade behind. Caller is responsible for the admin check.
///
/// # Errors
///
/// Returns [Error::GroupNotFound] if the group does not exist.
pub fn delete_group(group_id: GroupId, connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Immediate)?;

    transaction.execute("DELETE FROM expense WHERE group_id = ?1", [group_id])?;
    transaction.execute("DELETE FROM saved_filter WHERE group_id = ?1", [group_id])?;
    transaction.execute("DELETE FROM membership WHERE group_id = ?1", [group_id])?;
    let rows_affected = transaction.execute("DELETE FROM trip_group WHERE id = ?1", [group_id])?;

    if rows_affected == 0 {
        return Err(Error::GroupNotFound);
    }

    transaction.commit()?;

    Ok(())
}

fn map_group_row(row: &Row) -> Result<Group, rusqlite::Error> {
    let raw_trip_name: String = row.get(1)?;
    let raw_invite_code: String = row.get(3)?;
    let raw_custom_categories: String = row.get(6)?;
    // The column is written via serde_json, so a parse failure means outside
    // tampering. Treat it as no custom categories.
    let custom_categories = serde_json::from_str(&raw_custom_categories).unwrap_or_default();

    Ok(Group {
        id: row.get(0)?,
        trip_name: TripName::new_unchecked(&raw_trip_name),
        total_budget: row.get(2)?,
        invite_code: InviteCode::new_unchecked(&raw_invite_code),
        created_by: UserId::new(row.get(4)?),
        is_active: row.get(5)?,
        custom_categories,
    })
}

#[cfg(test)]
mod group_db_tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        group::domain::{DEFAULT_CATEGORIES, InviteCode, MemberRole, TripName},
        user::{Role, User, create_user},
    };

    use super::{
        add_custom_category, create_group, delete_group, get_group, get_group_by_invite_code,
        get_members, get_membership_role, get_user_groups, join_group, update_budget,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(email: &str, connection: &Connection) -> User {
        create_user(
            email,
            "Test Traveler",
            Role::User,
            PasswordHash::new_unchecked("hunter2"),
            connection,
        )
        .expect("Could not create test user")
    }

    #[test]
    fn create_group_makes_creator_the_admin() {
        let conn = get_test_connection();
        let user = create_test_user("ana@example.com", &conn);

        let group = create_group(
            TripName::new_unchecked("Japan 2026"),
            5000.0,
            user.id,
            &conn,
        )
        .expect("Could not create group");

        assert!(group.id > 0);
        assert!(group.is_active);
        assert_eq!(group.invite_code.as_ref().len(), 8);
        assert_eq!(
            get_membership_role(group.id, user.id, &conn),
            Ok(MemberRole::Admin)
        );
    }

    #[test]
    fn get_group_by_invite_code_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("ana@example.com", &conn);
        let group = create_group(
            TripName::new_unchecked("Japan 2026"),
            5000.0,
            user.id,
            &conn,
        )
        .unwrap();

        let found = get_group_by_invite_code(&group.invite_code, &conn).unwrap();

        assert_eq!(found, group);
    }

    #[test]
    fn get_group_by_unknown_invite_code_fails() {
        let conn = get_test_connection();

        let result = get_group_by_invite_code(&InviteCode::new_unchecked("ZZZZZZZZ"), &conn);

        assert_eq!(result, Err(Error::GroupNotFound));
    }

    #[test]
    fn join_group_adds_regular_member() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let joiner = create_test_user("ben@example.com", &conn);
        let group = create_group(
            TripName::new_unchecked("Japan 2026"),
            5000.0,
            admin.id,
            &conn,
        )
        .unwrap();

        join_group(group.id, joiner.id, &conn).expect("Could not join group");

        assert_eq!(
            get_membership_role(group.id, joiner.id, &conn),
            Ok(MemberRole::Member)
        );
    }

    #[test]
    fn join_group_twice_fails() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let joiner = create_test_user("ben@example.com", &conn);
        let group = create_group(
            TripName::new_unchecked("Japan 2026"),
            5000.0,
            admin.id,
            &conn,
        )
        .unwrap();

        join_group(group.id, joiner.id, &conn).unwrap();
        let result = join_group(group.id, joiner.id, &conn);

        assert_eq!(result, Err(Error::AlreadyMember));
    }

    #[test]
    fn get_user_groups_lists_joined_groups() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let joiner = create_test_user("ben@example.com", &conn);
        let first = create_group(TripName::new_unchecked("Japan"), 5000.0, admin.id, &conn)
            .unwrap();
        let second = create_group(TripName::new_unchecked("Peru"), 3000.0, admin.id, &conn)
            .unwrap();
        join_group(first.id, joiner.id, &conn).unwrap();

        let admin_groups = get_user_groups(admin.id, &conn).unwrap();
        let joiner_groups = get_user_groups(joiner.id, &conn).unwrap();

        assert_eq!(admin_groups.len(), 2);
        // Newest first.
        assert_eq!(admin_groups[0].id, second.id);
        assert_eq!(joiner_groups, vec![first]);
    }

    #[test]
    fn get_members_lists_admin_first() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let joiner = create_test_user("ben@example.com", &conn);
        let group = create_group(TripName::new_unchecked("Japan"), 5000.0, admin.id, &conn)
            .unwrap();
        join_group(group.id, joiner.id, &conn).unwrap();

        let members = get_members(group.id, &conn).unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user_id, admin.id);
        assert_eq!(members[0].role, MemberRole::Admin);
        assert_eq!(members[1].user_id, joiner.id);
        assert_eq!(members[1].role, MemberRole::Member);
    }

    #[test]
    fn update_budget_overwrites_value() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let group = create_group(TripName::new_unchecked("Japan"), 5000.0, admin.id, &conn)
            .unwrap();

        update_budget(group.id, 6500.0, &conn).expect("Could not update budget");

        let updated = get_group(group.id, &conn).unwrap();
        assert_eq!(updated.total_budget, 6500.0);
    }

    #[test]
    fn add_custom_category_registers_new_category_once() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let group = create_group(TripName::new_unchecked("Japan"), 5000.0, admin.id, &conn)
            .unwrap();

        add_custom_category(group.id, "Onsen", &conn).unwrap();
        add_custom_category(group.id, "Onsen", &conn).unwrap();

        let updated = get_group(group.id, &conn).unwrap();
        assert_eq!(updated.custom_categories, vec!["Onsen".to_string()]);
    }

    #[test]
    fn add_custom_category_ignores_default_categories() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let group = create_group(TripName::new_unchecked("Japan"), 5000.0, admin.id, &conn)
            .unwrap();

        add_custom_category(group.id, DEFAULT_CATEGORIES[0], &conn).unwrap();

        let updated = get_group(group.id, &conn).unwrap();
        assert!(updated.custom_categories.is_empty());
    }

    #[test]
    fn delete_group_cascades_to_memberships_and_expenses() {
        let conn = get_test_connection();
        let admin = create_test_user("ana@example.com", &conn);
        let group = create_group(TripName::new_unchecked("Japan"), 5000.0, admin.id, &conn)
            .unwrap();
        conn.execute(
            "INSERT INTO expense (group_id, user_id, amount, description, category, expense_date,
             created_at, updated_at)
             VALUES (?1, ?2, 10.0, 'Ramen', 'Food', '2026-03-01', '2026-03-01T12:00:00Z',
             '2026-03-01T12:00:00Z')",
            (group.id, admin.id.as_i64()),
        )
        .expect("Could not insert test expense");

        delete_group(group.id, &conn).expect("Could not delete group");

        assert_eq!(get_group(group.id, &conn), Err(Error::GroupNotFound));
        let expense_count: i64 = conn
            .query_row(
                "SELECT COUNT(id) FROM expense WHERE group_id = ?1",
                [group.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(expense_count, 0);
        let membership_count: i64 = conn
            .query_row(
                "SELECT COUNT(id) FROM membership WHERE group_id = ?1",
                [group.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(membership_count, 0);
    }

    #[test]
    fn delete_missing_group_fails() {
        let conn = get_test_connection();

        assert_eq!(delete_group(999, &conn), Err(Error::GroupNotFound));
    }
}
