use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ersha_core::{
    AuditEntry, AuditId, Device, DeviceDraft, DeviceId, DeviceStatus, DeviceType, Page,
    PageQuery, Sort, SortColumn, SortDirection,
};
use jiff::Timestamp;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::{ClientError, CollectionClient};

/// A [`CollectionClient`] that keeps the inventory in process.
///
/// Filtering, sorting and paging follow the rules of the REST API, so the
/// console behaves the same against either backend. Used by `--demo` and by
/// tests.
#[derive(Clone, Default)]
pub struct InMemoryCollection {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<DeviceId, Device>,
    audit: HashMap<DeviceId, Vec<AuditEntry>>,
}

impl Inner {
    fn record(&mut self, id: &DeviceId, action: &str, details: String) {
        let entry = AuditEntry {
            id: AuditId(Ulid::new().to_string().into_boxed_str()),
            action: action.into(),
            actor: Some("console".into()),
            timestamp: Timestamp::now(),
            details: Some(details.into_boxed_str()),
        };
        self.audit.entry(id.clone()).or_default().push(entry);
    }

    fn ensure_unique_serial(&self, draft: &DeviceDraft, except: Option<&DeviceId>) -> Result<(), ClientError> {
        let serial = draft.serial_number.trim();
        if serial.is_empty() {
            return Ok(());
        }

        let taken = self.devices.values().any(|device| {
            Some(&device.id) != except && device.serial_number.as_deref() == Some(serial)
        });
        if taken {
            return Err(ClientError::Server {
                status: 409,
                message: format!("serial number {serial} is already registered"),
            });
        }

        Ok(())
    }
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices<I>(devices: I) -> Self
    where
        I: IntoIterator<Item = Device>,
    {
        let devices = devices
            .into_iter()
            .map(|device| (device.id.clone(), device))
            .collect();

        Self {
            inner: Arc::new(Mutex::new(Inner {
                devices,
                audit: HashMap::new(),
            })),
        }
    }

    /// An inventory of made-up devices, enough to page through.
    pub fn seeded() -> Self {
        const SITES: [&str; 4] = ["HQ rack A", "HQ rack B", "Branch Nairobi", "Branch Kisumu"];

        let base = Timestamp::now();
        let devices = (0..48u32).map(|n| {
            let device_type = DeviceType::ALL[n as usize % DeviceType::ALL.len()];
            let status = DeviceStatus::ALL[(n as usize / 3) % DeviceStatus::ALL.len()];
            let stamp = base
                .checked_sub(jiff::SignedDuration::from_mins(i64::from(n) * 37))
                .unwrap_or(base);

            Device {
                id: DeviceId(Ulid::new().to_string().into_boxed_str()),
                name: format!("{}-{:02}", device_type.wire_name().to_lowercase(), n + 1)
                    .into_boxed_str(),
                device_type,
                status,
                address: Some(format!("10.{}.{}.{}", n / 16, n % 16, 10 + n).into_boxed_str()),
                location: Some(SITES[n as usize % SITES.len()].into()),
                serial_number: Some(format!("SN-{:06}", 104_729 * (n + 1) % 1_000_000).into_boxed_str()),
                description: None,
                created_at: Some(stamp),
                updated_at: Some(stamp),
            }
        });

        Self::with_devices(devices)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.devices.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.devices.is_empty()
    }
}

fn matches_query(device: &Device, query: &PageQuery) -> bool {
    if let Some(status) = query.status
        && device.status != status
    {
        return false;
    }

    if let Some(device_type) = query.device_type
        && device.device_type != device_type
    {
        return false;
    }

    if let Some(q) = &query.q {
        let needle = q.to_lowercase();
        let haystacks = [
            Some(&device.name),
            device.address.as_ref(),
            device.location.as_ref(),
            device.serial_number.as_ref(),
            device.description.as_ref(),
        ];
        let found = haystacks
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(&needle));
        if !found {
            return false;
        }
    }

    true
}

fn compare_text(a: &Option<Box<str>>, b: &Option<Box<str>>) -> Ordering {
    let a = a.as_deref().map(str::to_lowercase);
    let b = b.as_deref().map(str::to_lowercase);
    a.cmp(&b)
}

fn sort_devices(devices: &mut [&Device], sort: &Sort) {
    devices.sort_by(|a, b| {
        let ord = match sort.column {
            SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortColumn::Type => a.device_type.wire_name().cmp(b.device_type.wire_name()),
            SortColumn::Status => a.status.wire_name().cmp(b.status.wire_name()),
            SortColumn::Address => compare_text(&a.address, &b.address),
            SortColumn::Location => compare_text(&a.location, &b.location),
            SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
        // Stable pages need a total order.
        .then_with(|| a.id.0.cmp(&b.id.0));

        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

fn paginate(devices: Vec<&Device>, page: usize, size: usize) -> Page<Device> {
    let size = size.max(1);
    let total = devices.len();

    Page {
        content: devices
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .cloned()
            .collect(),
        total_elements: total as u64,
        total_pages: total.div_ceil(size),
    }
}

fn server_side_check(draft: &DeviceDraft) -> Result<(), ClientError> {
    draft.validate().map_err(|e| ClientError::Server {
        status: 400,
        message: e.to_string(),
    })
}

fn text_field(value: &str) -> Option<Box<str>> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.into())
}

#[async_trait]
impl CollectionClient for InMemoryCollection {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page<Device>, ClientError> {
        let inner = self.inner.lock().await;
        let mut filtered: Vec<&Device> = inner
            .devices
            .values()
            .filter(|device| matches_query(device, query))
            .collect();
        sort_devices(&mut filtered, &query.sort);

        Ok(paginate(filtered, query.page, query.size))
    }

    async fn fetch_one(&self, id: &DeviceId) -> Result<Device, ClientError> {
        let inner = self.inner.lock().await;
        inner
            .devices
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::not_found(format_args!("device {id}")))
    }

    async fn create(&self, draft: &DeviceDraft) -> Result<Device, ClientError> {
        server_side_check(draft)?;

        let mut inner = self.inner.lock().await;
        inner.ensure_unique_serial(draft, None)?;

        let now = Timestamp::now();
        let device = Device {
            id: DeviceId(Ulid::new().to_string().into_boxed_str()),
            name: draft.name.trim().into(),
            device_type: draft.device_type,
            status: draft.status,
            address: text_field(&draft.address),
            location: text_field(&draft.location),
            serial_number: text_field(&draft.serial_number),
            description: text_field(&draft.description),
            created_at: Some(now),
            updated_at: Some(now),
        };

        inner.record(&device.id, "CREATE", format!("created {}", device.name));
        inner.devices.insert(device.id.clone(), device.clone());

        Ok(device)
    }

    async fn update(&self, id: &DeviceId, draft: &DeviceDraft) -> Result<Device, ClientError> {
        server_side_check(draft)?;

        let mut inner = self.inner.lock().await;
        inner.ensure_unique_serial(draft, Some(id))?;

        let existing = inner
            .devices
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::not_found(format_args!("device {id}")))?;

        let updated = Device {
            name: draft.name.trim().into(),
            device_type: draft.device_type,
            status: draft.status,
            address: text_field(&draft.address),
            location: text_field(&draft.location),
            serial_number: text_field(&draft.serial_number),
            description: text_field(&draft.description),
            updated_at: Some(Timestamp::now()),
            ..existing
        };

        inner.record(id, "UPDATE", format!("updated {}", updated.name));
        inner.devices.insert(id.clone(), updated.clone());

        Ok(updated)
    }

    async fn delete(&self, id: &DeviceId) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().await;
        let removed = inner
            .devices
            .remove(id)
            .ok_or_else(|| ClientError::not_found(format_args!("device {id}")))?;

        inner.record(id, "DELETE", format!("deleted {}", removed.name));
        Ok(())
    }

    async fn fetch_audit_log(&self, id: &DeviceId) -> Result<Vec<AuditEntry>, ClientError> {
        let inner = self.inner.lock().await;
        match inner.audit.get(id) {
            Some(entries) => Ok(entries.iter().rev().cloned().collect()),
            None if inner.devices.contains_key(id) => Ok(Vec::new()),
            None => Err(ClientError::not_found(format_args!("device {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: usize, size: usize) -> PageQuery {
        PageQuery {
            page,
            size,
            sort: Sort::new(SortColumn::Name, SortDirection::Ascending),
            status: None,
            device_type: None,
            q: None,
        }
    }

    fn draft(name: &str, serial: &str) -> DeviceDraft {
        DeviceDraft {
            name: name.to_string(),
            address: "10.0.0.1".to_string(),
            serial_number: serial.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pagination_totals() {
        let collection = InMemoryCollection::seeded();

        let page = collection.fetch_page(&query(0, 20)).await.unwrap();
        assert_eq!(page.total_elements, 48);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 20);

        let last = collection.fetch_page(&query(2, 20)).await.unwrap();
        assert_eq!(last.content.len(), 8);

        let beyond = collection.fetch_page(&query(5, 20)).await.unwrap();
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[tokio::test]
    async fn test_sorting_by_name() {
        let collection = InMemoryCollection::new();
        for name in ["delta", "Alpha", "charlie", "bravo"] {
            collection.create(&draft(name, "")).await.unwrap();
        }

        let page = collection.fetch_page(&query(0, 10)).await.unwrap();
        let names: Vec<&str> = page.content.iter().map(|d| &*d.name).collect();
        assert_eq!(names, ["Alpha", "bravo", "charlie", "delta"]);

        let mut descending = query(0, 10);
        descending.sort.direction = SortDirection::Descending;
        let page = collection.fetch_page(&descending).await.unwrap();
        assert_eq!(&*page.content[0].name, "delta");
    }

    #[tokio::test]
    async fn test_filters_and_search() {
        let collection = InMemoryCollection::new();
        let mut router = draft("edge-router", "SN-1");
        router.device_type = DeviceType::Router;
        router.location = "Lobby".to_string();
        collection.create(&router).await.unwrap();

        let mut switch = draft("floor-switch", "SN-2");
        switch.device_type = DeviceType::Switch;
        switch.status = DeviceStatus::Maintenance;
        collection.create(&switch).await.unwrap();

        let mut by_type = query(0, 10);
        by_type.device_type = Some(DeviceType::Switch);
        let page = collection.fetch_page(&by_type).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(&*page.content[0].name, "floor-switch");

        let mut by_status = query(0, 10);
        by_status.status = Some(DeviceStatus::Active);
        let page = collection.fetch_page(&by_status).await.unwrap();
        assert_eq!(&*page.content[0].name, "edge-router");

        let mut search = query(0, 10);
        search.q = Some("LOBBY".to_string());
        let page = collection.fetch_page(&search).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(&*page.content[0].name, "edge-router");
    }

    #[tokio::test]
    async fn test_duplicate_serial_is_rejected() {
        let collection = InMemoryCollection::new();
        let first = collection.create(&draft("a", "SN-9")).await.unwrap();

        let err = collection.create(&draft("b", "SN-9")).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 409, .. }));

        // Updating the owner of the serial keeps it.
        collection.update(&first.id, &draft("a2", "SN-9")).await.unwrap();
    }

    #[tokio::test]
    async fn test_audit_log_tracks_changes() {
        let collection = InMemoryCollection::new();
        let device = collection.create(&draft("probe", "")).await.unwrap();
        collection.update(&device.id, &draft("probe-2", "")).await.unwrap();

        let log = collection.fetch_audit_log(&device.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(&*log[0].action, "UPDATE");
        assert_eq!(&*log[1].action, "CREATE");

        collection.delete(&device.id).await.unwrap();
        assert!(collection.fetch_one(&device.id).await.is_err());
        let log = collection.fetch_audit_log(&device.id).await.unwrap();
        assert_eq!(&*log[0].action, "DELETE");
    }

    #[tokio::test]
    async fn test_missing_device_is_not_found() {
        let collection = InMemoryCollection::new();
        let err = collection.fetch_one(&DeviceId::from("nope")).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 404, .. }));
    }
}
