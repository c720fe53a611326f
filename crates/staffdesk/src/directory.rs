//! HR directory backed by a JSON file
//!
//! The file holds every employee's records in the same shape as
//! [`LeaveSnapshot`]. A missing file is an empty directory; it is created
//! on the first write.

use async_trait::async_trait;
use staffdesk_api::{
    CreatedLeave, LeaveKind, LeavePeriod, LeaveSnapshot, PermissionPayload, PermissionStatus,
    VacationPayload, VacationStatus,
};
use staffdesk_host_api::{DirectoryError, DirectoryResult, LeaveDirectory};
use staffdesk_util::{EmployeeId, LeaveId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct JsonFileDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> DirectoryResult<LeaveSnapshot> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Directory file missing, treating as empty");
                return Ok(LeaveSnapshot::empty());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            DirectoryError::Serialization(format!("{}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, snapshot: &LeaveSnapshot) -> DirectoryResult<()> {
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| DirectoryError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn insert(&self, period: LeavePeriod) -> DirectoryResult<LeavePeriod> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.load().await?;

        let next_id = all
            .vacations
            .iter()
            .chain(all.permissions.iter())
            .map(|p| p.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        let period = LeavePeriod {
            id: LeaveId::new(next_id),
            ..period
        };

        match period.kind() {
            LeaveKind::Vacation => all.vacations.push(period.clone()),
            LeaveKind::Permission => all.permissions.push(period.clone()),
        }
        self.save(&all).await?;

        info!(
            path = %self.path.display(),
            leave_id = %period.id,
            kind = %period.kind(),
            "Leave record created"
        );
        Ok(period)
    }
}

fn receipt(period: &LeavePeriod, day_count: u32) -> CreatedLeave {
    CreatedLeave {
        id: period.id,
        kind: period.kind(),
        employee_id: period.employee_id,
        start_date: period.start_date,
        end_date: period.end_date,
        day_count,
    }
}

#[async_trait]
impl LeaveDirectory for JsonFileDirectory {
    async fn list_leave_periods(&self, employee_id: EmployeeId) -> DirectoryResult<LeaveSnapshot> {
        let all = self.load().await?;
        let mine = |p: &LeavePeriod| p.employee_id == employee_id;

        Ok(LeaveSnapshot::new(
            all.vacations.into_iter().filter(mine).collect(),
            all.permissions.into_iter().filter(mine).collect(),
        ))
    }

    async fn create_vacation(&self, payload: VacationPayload) -> DirectoryResult<CreatedLeave> {
        let period = self
            .insert(LeavePeriod::vacation(
                0,
                payload.employee_id,
                payload.start_date,
                payload.end_date,
                VacationStatus::Planned,
            ))
            .await?;
        Ok(receipt(&period, payload.days_granted))
    }

    async fn create_permission(
        &self,
        payload: PermissionPayload,
    ) -> DirectoryResult<CreatedLeave> {
        let period = self
            .insert(LeavePeriod::permission(
                0,
                payload.employee_id,
                payload.start_date,
                payload.end_date,
                PermissionStatus::Pending,
            ))
            .await?;
        Ok(receipt(&period, payload.days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let directory = JsonFileDirectory::new(dir.path().join("leave.json"));

        let snapshot = directory.list_leave_periods(EmployeeId::new(1)).await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn reads_records_per_employee() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leave.json");
        std::fs::write(
            &path,
            r#"{
                "vacations": [
                    {"id": 1, "employee_id": 1, "start_date": "2024-03-01", "end_date": "2024-03-03",
                     "status": {"kind": "vacation", "status": "in_progress"}},
                    {"id": 2, "employee_id": 2, "start_date": "2024-03-01", "end_date": "2024-03-03",
                     "status": {"kind": "vacation", "status": "planned"}}
                ],
                "permissions": [
                    {"id": 3, "employee_id": 1, "start_date": "2024-03-10", "end_date": "2024-03-10",
                     "status": {"kind": "permission", "status": "approved"}}
                ]
            }"#,
        )
        .unwrap();

        let directory = JsonFileDirectory::new(&path);
        let snapshot = directory.list_leave_periods(EmployeeId::new(1)).await.unwrap();

        assert_eq!(snapshot.vacations.len(), 1);
        assert_eq!(snapshot.permissions.len(), 1);
        assert_eq!(snapshot.vacations[0].status.kind(), LeaveKind::Vacation);
        assert!(snapshot.permissions[0].is_active());
    }

    #[tokio::test]
    async fn malformed_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leave.json");
        std::fs::write(&path, "not json").unwrap();

        let directory = JsonFileDirectory::new(&path);
        let result = directory.list_leave_periods(EmployeeId::new(1)).await;
        assert!(matches!(result, Err(DirectoryError::Serialization(_))));
    }

    #[tokio::test]
    async fn created_records_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let directory = JsonFileDirectory::new(dir.path().join("nested").join("leave.json"));

        let vacation = directory
            .create_vacation(VacationPayload {
                employee_id: EmployeeId::new(1),
                start_date: day("2024-06-01"),
                end_date: day("2024-06-05"),
                days_granted: 5,
                days_taken: 5,
                reason: None,
            })
            .await
            .unwrap();
        let permission = directory
            .create_permission(PermissionPayload {
                employee_id: EmployeeId::new(1),
                start_date: day("2024-07-01"),
                end_date: day("2024-07-01"),
                days: 1,
                hours: 4,
                reason: Some("dentist".into()),
            })
            .await
            .unwrap();

        assert_eq!(vacation.id, LeaveId::new(1));
        assert_eq!(vacation.day_count, 5);
        assert_eq!(permission.id, LeaveId::new(2));

        let reopened = JsonFileDirectory::new(directory.path());
        let snapshot = reopened.list_leave_periods(EmployeeId::new(1)).await.unwrap();
        assert_eq!(snapshot.vacations.len(), 1);
        assert_eq!(snapshot.permissions.len(), 1);
        assert!(snapshot.vacations[0].is_active());
    }
}
