// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ozopool_app::{
    ALL_FILTER, AppCommand, AppEvent, AppMode, AppState, ControlDevice, Device, DeviceCommand,
    DeviceFormInput, DeviceId, DeviceThresholds, FetchGate, FetchTicket, FormKind, FormPayload,
    ListRow, ListViewState, Organization, OrganizationFormInput, PoolStatus, ReadingBand,
    ScreenKind, SensorKind, SensorSnapshot, SwitchAction, User, UserFormInput, location_countries,
    location_states, pool_health, schema_for,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs};
use std::collections::BTreeMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const EVENT_POLL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

/// Records for one screen, as fetched. The list view projects them;
/// this type never reorders or mutates.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenRecords {
    Devices(Vec<Device>),
    Organizations(Vec<Organization>),
    Users(Vec<User>),
}

impl ScreenRecords {
    pub const fn screen(&self) -> ScreenKind {
        match self {
            Self::Devices(_) => ScreenKind::Devices,
            Self::Organizations(_) => ScreenKind::Organizations,
            Self::Users(_) => ScreenKind::Users,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Devices(rows) => rows.len(),
            Self::Organizations(rows) => rows.len(),
            Self::Users(rows) => rows.len(),
        }
    }

    pub const fn empty_for(screen: ScreenKind) -> Self {
        match screen {
            ScreenKind::Devices => Self::Devices(Vec::new()),
            ScreenKind::Organizations => Self::Organizations(Vec::new()),
            ScreenKind::Users => Self::Users(Vec::new()),
        }
    }
}

/// Row-level mutations the table offers. Devices are the only screen
/// with real deletion; the rest archive via status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDetailView {
    pub owner_id: String,
    pub snapshot: SensorSnapshot,
    pub thresholds: DeviceThresholds,
}

/// Organization drill-down: the profile, a device rollup, and the
/// children the backend nests under it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationDetailView {
    pub organization: Organization,
    pub total_devices: u64,
    pub active_devices: u64,
    pub need_attention: u64,
    pub sub_organizations: Vec<Organization>,
    pub users: Vec<User>,
    pub devices: Vec<Device>,
}

pub trait AppRuntime {
    fn load_records(&mut self, screen: ScreenKind) -> Result<ScreenRecords>;
    fn submit_form(&mut self, payload: &FormPayload, editing: Option<&str>) -> Result<()>;
    fn apply_record_action(
        &mut self,
        screen: ScreenKind,
        row_id: &str,
        action: RecordAction,
    ) -> Result<()>;
    fn open_device_detail(&mut self, device_id: &DeviceId) -> Result<DeviceDetailView>;
    fn open_organization_detail(
        &mut self,
        organization_id: &str,
    ) -> Result<OrganizationDetailView>;
    /// Latest telemetry update since the last poll, if the runtime has a
    /// live feed for the open detail. Cheap; called every frame.
    fn poll_device_detail(&mut self) -> Option<DeviceDetailView> {
        None
    }
    fn close_device_detail(&mut self) {}
    fn send_command(&mut self, device_id: &DeviceId, command: &DeviceCommand) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq)]
struct RowView {
    id: String,
    status: String,
    cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct ScreenUiState {
    list: ListViewState,
    records: ScreenRecords,
    cursor: usize,
}

impl ScreenUiState {
    fn new(screen: ScreenKind) -> Self {
        Self {
            list: ListViewState::new(schema_for(screen)),
            records: ScreenRecords::empty_for(screen),
            cursor: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FormField {
    label: &'static str,
    value: String,
}

#[derive(Debug, Clone, PartialEq)]
struct FormUiState {
    kind: FormKind,
    fields: Vec<FormField>,
    cursor: usize,
    editing: Option<String>,
}

impl FormUiState {
    fn blank(kind: FormKind) -> Self {
        let labels: &[&'static str] = match kind {
            FormKind::Device => &["Device ID", "MQTT Topic", "Country", "State", "City"],
            FormKind::Organization => &[
                "Organization",
                "Contact",
                "Email",
                "Phone",
                "Customer Type",
                "Address",
                "Country",
                "State",
                "City",
            ],
            FormKind::User => &["Username", "Email", "Role"],
        };
        Self {
            kind,
            fields: labels
                .iter()
                .map(|label| FormField {
                    label,
                    value: String::new(),
                })
                .collect(),
            cursor: 0,
            editing: None,
        }
    }

    fn payload(&self) -> FormPayload {
        let value = |index: usize| {
            self.fields
                .get(index)
                .map(|field| field.value.clone())
                .unwrap_or_default()
        };
        match self.kind {
            FormKind::Device => FormPayload::Device(DeviceFormInput {
                device_id: value(0),
                mqtt_topic: value(1),
                country: value(2),
                state: value(3),
                city: value(4),
            }),
            FormKind::Organization => FormPayload::Organization(OrganizationFormInput {
                organization_name: value(0),
                contact_name: value(1),
                email: value(2),
                phone_no: value(3),
                customer_type: value(4),
                address: value(5),
                country: value(6),
                state: value(7),
                city: value(8),
            }),
            FormKind::User => FormPayload::User(UserFormInput {
                username: value(0),
                email: value(1),
                user_role: value(2),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DetailUiState {
    device_id: DeviceId,
    view: DeviceDetailView,
    equipment_on: [bool; ControlDevice::ALL.len()],
}

struct ViewData {
    screens: BTreeMap<ScreenKind, ScreenUiState>,
    gate: FetchGate,
    form: Option<FormUiState>,
    detail: Option<DetailUiState>,
    org_detail: Option<OrganizationDetailView>,
    status_token: u64,
}

impl ViewData {
    fn new() -> Self {
        let screens = ScreenKind::ALL
            .into_iter()
            .map(|screen| (screen, ScreenUiState::new(screen)))
            .collect();
        Self {
            screens,
            gate: FetchGate::new(),
            form: None,
            detail: None,
            org_detail: None,
            status_token: 0,
        }
    }

    fn screen_ui(&self, screen: ScreenKind) -> &ScreenUiState {
        self.screens.get(&screen).expect("every screen is seeded")
    }

    fn screen_ui_mut(&mut self, screen: ScreenKind) -> &mut ScreenUiState {
        self.screens
            .get_mut(&screen)
            .expect("every screen is seeded")
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_screen(runtime, &mut view_data, state.active_screen) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        pump_telemetry(runtime, &mut view_data);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(EVENT_POLL).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn pump_telemetry<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) {
    if let Some(detail) = &mut view_data.detail
        && let Some(update) = runtime.poll_device_detail()
    {
        detail.view = update;
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Fetches through the gate: the result is applied only when its ticket
/// is still the newest for that screen.
fn refresh_screen<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    screen: ScreenKind,
) -> Result<()> {
    let ticket = view_data.gate.begin(screen);
    let records = runtime.load_records(screen)?;
    apply_fetch(view_data, screen, ticket, records);
    Ok(())
}

fn apply_fetch(
    view_data: &mut ViewData,
    screen: ScreenKind,
    ticket: FetchTicket,
    records: ScreenRecords,
) -> bool {
    if !view_data.gate.is_current(screen, ticket) {
        return false;
    }
    let ui = view_data.screen_ui_mut(screen);
    ui.records = records;
    ui.cursor = 0;
    true
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        let events = state.dispatch(AppCommand::Logout);
        return events.contains(&AppEvent::SessionEnded);
    }

    if view_data.form.is_some() {
        handle_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.detail.is_some() {
        handle_detail_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.org_detail.is_some() {
        if key.code == KeyCode::Esc {
            view_data.org_detail = None;
            state.dispatch(AppCommand::CloseDetail);
        }
        return false;
    }

    if state.mode == AppMode::Search {
        handle_search_key(state, view_data, key);
        return false;
    }

    handle_nav_key(state, runtime, view_data, internal_tx, key);
    false
}

fn handle_search_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let screen = state.active_screen;
    let ui = view_data.screen_ui_mut(screen);
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Backspace => {
            let mut term = ui.list.search_term().to_owned();
            term.pop();
            ui.list.set_search_term(&term);
            ui.cursor = 0;
        }
        KeyCode::Char(ch) => {
            let mut term = ui.list.search_term().to_owned();
            term.push(ch);
            ui.list.set_search_term(&term);
            ui.cursor = 0;
        }
        _ => {}
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('f'), KeyModifiers::NONE) => {
            state.dispatch(AppCommand::NextScreen);
            refresh_or_report(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('b'), KeyModifiers::NONE) => {
            state.dispatch(AppCommand::PrevScreen);
            refresh_or_report(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('/'), _) => {
            state.dispatch(AppCommand::EnterSearch);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            refresh_or_report(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            let ui = view_data.screen_ui_mut(state.active_screen);
            let next = cycle_with_all(ui.list.schema().categories, ui.list.category_filter());
            ui.list.set_category_filter(&next);
            ui.cursor = 0;
        }
        (KeyCode::Char('t'), KeyModifiers::NONE) => {
            let ui = view_data.screen_ui_mut(state.active_screen);
            let next = cycle_with_all(ui.list.schema().status_tabs, ui.list.status_tab());
            ui.list.set_status_tab(&next);
            ui.cursor = 0;
        }
        (KeyCode::Char(ch @ '1'..='9'), KeyModifiers::NONE) => {
            let index = (ch as usize) - ('1' as usize);
            let ui = view_data.screen_ui_mut(state.active_screen);
            if let Some(column) = ui.list.schema().columns.get(index) {
                ui.list.toggle_column(column.key);
            }
        }
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            move_cursor(view_data, state.active_screen, 1);
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            move_cursor(view_data, state.active_screen, -1);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            let kind = form_kind_for(state.active_screen);
            view_data.form = Some(FormUiState::blank(kind));
            state.dispatch(AppCommand::OpenForm(kind));
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            let screen = state.active_screen;
            let selected = selected_row(view_data, screen).map(|row| row.id);
            let Some(id) = selected else {
                emit_status(state, view_data, internal_tx, "no row selected");
                return;
            };
            match form_for_edit(&view_data.screen_ui(screen).records, &id) {
                Some(form) => {
                    let kind = form.kind;
                    view_data.form = Some(form);
                    state.dispatch(AppCommand::OpenForm(kind));
                }
                None => emit_status(state, view_data, internal_tx, "row no longer present"),
            }
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            apply_row_action(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Enter, _) => match state.active_screen {
            ScreenKind::Devices => {
                let Some(row) = selected_row(view_data, ScreenKind::Devices) else {
                    emit_status(state, view_data, internal_tx, "no device selected");
                    return;
                };
                let device_id = DeviceId::from(row.id.as_str());
                match runtime.open_device_detail(&device_id) {
                    Ok(view) => {
                        view_data.detail = Some(DetailUiState {
                            device_id,
                            view,
                            equipment_on: default_equipment_state(),
                        });
                        state.dispatch(AppCommand::OpenDetail);
                    }
                    Err(error) => {
                        emit_status(
                            state,
                            view_data,
                            internal_tx,
                            format!("detail failed: {error}"),
                        );
                    }
                }
            }
            ScreenKind::Organizations => {
                let Some(row) = selected_row(view_data, ScreenKind::Organizations) else {
                    emit_status(state, view_data, internal_tx, "no organization selected");
                    return;
                };
                match runtime.open_organization_detail(&row.id) {
                    Ok(view) => {
                        view_data.org_detail = Some(view);
                        state.dispatch(AppCommand::OpenDetail);
                    }
                    Err(error) => {
                        emit_status(
                            state,
                            view_data,
                            internal_tx,
                            format!("detail failed: {error}"),
                        );
                    }
                }
            }
            ScreenKind::Users => {}
        },
        _ => {}
    }
}

fn refresh_or_report<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_screen(runtime, view_data, state.active_screen) {
        emit_status(state, view_data, internal_tx, format!("load failed: {error}"));
    }
}

fn apply_row_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let screen = state.active_screen;
    let Some(row) = selected_row(view_data, screen) else {
        emit_status(state, view_data, internal_tx, "no row selected");
        return;
    };

    let (action, verb) = match screen {
        ScreenKind::Devices => (RecordAction::Delete, "deleted"),
        ScreenKind::Organizations | ScreenKind::Users => {
            if row.status == "Active" {
                (RecordAction::Deactivate, "deactivated")
            } else {
                (RecordAction::Activate, "activated")
            }
        }
    };

    match runtime.apply_record_action(screen, &row.id, action) {
        Ok(()) => {
            refresh_or_report(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, format!("{} {verb}", row.id));
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("action failed: {error}"));
        }
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = &mut view_data.form else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            view_data.form = None;
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Tab | KeyCode::Down => {
            form.cursor = (form.cursor + 1) % form.fields.len();
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.cursor = form.cursor.checked_sub(1).unwrap_or(form.fields.len() - 1);
        }
        KeyCode::Backspace => {
            form.fields[form.cursor].value.pop();
        }
        KeyCode::Char(ch) => {
            form.fields[form.cursor].value.push(ch);
        }
        KeyCode::Enter => {
            let payload = form.payload();
            let editing = form.editing.clone();
            match runtime.submit_form(&payload, editing.as_deref()) {
                Ok(()) => {
                    view_data.form = None;
                    state.dispatch(AppCommand::ExitToNav);
                    refresh_or_report(state, runtime, view_data, internal_tx);
                    emit_status(state, view_data, internal_tx, "saved");
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("save failed: {error}"));
                }
            }
        }
        _ => {}
    }
}

fn handle_detail_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            runtime.close_device_detail();
            view_data.detail = None;
            state.dispatch(AppCommand::CloseDetail);
        }
        KeyCode::Char(ch @ '1'..='5') => {
            let index = (ch as usize) - ('1' as usize);
            let Some(detail) = &mut view_data.detail else {
                return;
            };
            let device = ControlDevice::ALL[index];
            let turning_on = !detail.equipment_on[index];
            let command = DeviceCommand {
                device,
                action: if turning_on {
                    SwitchAction::On
                } else {
                    SwitchAction::Off
                },
                timer: if turning_on {
                    default_timer(device).map(str::to_owned)
                } else {
                    None
                },
            };
            let device_id = detail.device_id.clone();
            match runtime.send_command(&device_id, &command) {
                Ok(()) => {
                    if let Some(detail) = &mut view_data.detail {
                        detail.equipment_on[index] = turning_on;
                    }
                    let message = format!(
                        "{} {}",
                        device.label(),
                        if turning_on { "on" } else { "off" }
                    );
                    emit_status(state, view_data, internal_tx, message);
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("command failed: {error}"));
                }
            }
        }
        _ => {}
    }
}

/// Controller power-on defaults: the filtration pump and UV sterilizer
/// run continuously, everything else starts off.
pub fn default_equipment_state() -> [bool; ControlDevice::ALL.len()] {
    let mut states = [false; ControlDevice::ALL.len()];
    for (index, device) in ControlDevice::ALL.into_iter().enumerate() {
        states[index] = matches!(device, ControlDevice::Filtration | ControlDevice::Uv);
    }
    states
}

/// Factory-default schedules for timer-capable equipment.
pub const fn default_timer(device: ControlDevice) -> Option<&'static str> {
    match device {
        ControlDevice::Ozone => Some("08:00"),
        ControlDevice::Filtration => Some("06:00"),
        ControlDevice::Uv => Some("12:00"),
        ControlDevice::Heater | ControlDevice::Dosing => None,
    }
}

/// Builds a prefilled edit form for the row with the given id, or `None`
/// when the row has vanished from the current records.
fn form_for_edit(records: &ScreenRecords, row_id: &str) -> Option<FormUiState> {
    match records {
        ScreenRecords::Devices(rows) => {
            let row = rows.iter().find(|row| row.device_id.as_str() == row_id)?;
            let mut form = FormUiState::blank(FormKind::Device);
            form.fields[0].value = row.device_id.as_str().to_owned();
            form.fields[1].value = row.mqtt_topic.clone();
            // Device rows carry state and city only; the country is
            // recovered from the location tables.
            form.fields[2].value = country_for_state(&row.state).unwrap_or_default().to_owned();
            form.fields[3].value = row.state.clone();
            form.fields[4].value = row.city.clone();
            form.editing = Some(row_id.to_owned());
            Some(form)
        }
        ScreenRecords::Organizations(rows) => {
            let row = rows.iter().find(|row| row.id.as_str() == row_id)?;
            let mut form = FormUiState::blank(FormKind::Organization);
            form.fields[0].value = row.organization_name.clone();
            form.fields[1].value = row.contact_name.clone();
            form.fields[2].value = row.email.clone();
            form.fields[3].value = row.phone_no.clone();
            form.fields[4].value = row.customer_type.clone();
            form.fields[5].value = row.address.clone();
            form.fields[6].value = row.country.clone();
            form.fields[7].value = row.state.clone();
            form.fields[8].value = row.city.clone();
            form.editing = Some(row_id.to_owned());
            Some(form)
        }
        ScreenRecords::Users(rows) => {
            let row = rows.iter().find(|row| row.id.as_str() == row_id)?;
            let mut form = FormUiState::blank(FormKind::User);
            form.fields[0].value = row.username.clone();
            form.fields[1].value = row.email.clone();
            form.fields[2].value = row.user_role.clone();
            form.editing = Some(row_id.to_owned());
            Some(form)
        }
    }
}

fn country_for_state(state: &str) -> Option<&'static str> {
    location_countries()
        .iter()
        .find(|country| location_states(country).contains(&state))
        .copied()
}

const fn form_kind_for(screen: ScreenKind) -> FormKind {
    match screen {
        ScreenKind::Devices => FormKind::Device,
        ScreenKind::Organizations => FormKind::Organization,
        ScreenKind::Users => FormKind::User,
    }
}

// "All" -> first option -> ... -> last option -> "All".
fn cycle_with_all(options: &[&'static str], current: &str) -> String {
    if current.eq_ignore_ascii_case(ALL_FILTER) {
        return options.first().map_or_else(|| "All".to_owned(), |first| (*first).to_owned());
    }
    match options.iter().position(|option| *option == current) {
        Some(index) if index + 1 < options.len() => options[index + 1].to_owned(),
        _ => "All".to_owned(),
    }
}

fn move_cursor(view_data: &mut ViewData, screen: ScreenKind, delta: isize) {
    let len = visible_rows(view_data.screen_ui(screen)).len();
    let ui = view_data.screen_ui_mut(screen);
    if len == 0 {
        ui.cursor = 0;
        return;
    }
    let current = ui.cursor.min(len - 1) as isize;
    ui.cursor = (current + delta).clamp(0, len as isize - 1) as usize;
}

fn selected_row(view_data: &ViewData, screen: ScreenKind) -> Option<RowView> {
    let ui = view_data.screen_ui(screen);
    let rows = visible_rows(ui);
    if rows.is_empty() {
        return None;
    }
    let index = ui.cursor.min(rows.len() - 1);
    rows.into_iter().nth(index)
}

fn visible_rows(ui: &ScreenUiState) -> Vec<RowView> {
    match &ui.records {
        ScreenRecords::Devices(rows) => project(&ui.list, rows, |row| row.device_id.as_str()),
        ScreenRecords::Organizations(rows) => project(&ui.list, rows, |row| row.id.as_str()),
        ScreenRecords::Users(rows) => project(&ui.list, rows, |row| row.id.as_str()),
    }
}

fn project<R: ListRow>(
    list: &ListViewState,
    rows: &[R],
    id_of: impl Fn(&R) -> &str,
) -> Vec<RowView> {
    let columns = list.visible_columns();
    list.filtered(rows)
        .into_iter()
        .map(|row| RowView {
            id: id_of(row).to_owned(),
            status: row.status().to_owned(),
            cells: columns
                .iter()
                .map(|column| row.field(column.key).to_owned())
                .collect(),
        })
        .collect()
}

fn header_labels(list: &ListViewState) -> Vec<&'static str> {
    list.visible_columns()
        .into_iter()
        .map(|column| column.label)
        .collect()
}

/// One entry per tab: label, count, active flag. "All" always counts
/// every record, including statuses without a tab of their own.
fn status_tab_entries(ui: &ScreenUiState) -> Vec<(String, usize, bool)> {
    let counts: BTreeMap<&str, usize> = match &ui.records {
        ScreenRecords::Devices(rows) => ui.list.status_counts(rows).into_iter().collect(),
        ScreenRecords::Organizations(rows) => ui.list.status_counts(rows).into_iter().collect(),
        ScreenRecords::Users(rows) => ui.list.status_counts(rows).into_iter().collect(),
    };
    let active_tab = ui.list.status_tab();

    let mut entries = vec![(
        "All".to_owned(),
        ui.records.row_count(),
        active_tab.eq_ignore_ascii_case(ALL_FILTER),
    )];
    for tab in ui.list.schema().status_tabs {
        entries.push((
            (*tab).to_owned(),
            counts.get(tab).copied().unwrap_or(0),
            active_tab == *tab,
        ));
    }
    entries
}

fn status_tab_line(ui: &ScreenUiState) -> String {
    status_tab_entries(ui)
        .into_iter()
        .map(|(label, count, active)| {
            if active {
                format!("[{label} {count}]")
            } else {
                format!(" {label} {count} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reading rows for the detail card. Ozone has no configured range and
/// carries no band.
fn reading_rows(view: &DeviceDetailView) -> Vec<(&'static str, String, Option<ReadingBand>)> {
    SensorKind::ALL
        .into_iter()
        .map(|sensor| {
            let value = match sensor {
                SensorKind::Ph => view.snapshot.ph,
                SensorKind::Orp => view.snapshot.orp,
                SensorKind::Temperature => view.snapshot.temperature,
                SensorKind::OzoneLevel => view.snapshot.ozone_level,
            };
            let band = view
                .thresholds
                .range_for(sensor)
                .map(|range| ReadingBand::classify(value, range));
            let unit = sensor.unit();
            let rendered = if unit.is_empty() {
                format!("{value:.1}")
            } else {
                format!("{value:.1} {unit}")
            };
            (sensor.label(), rendered, band)
        })
        .collect()
}

fn detail_health(view: &DeviceDetailView) -> PoolStatus {
    pool_health(&view.snapshot, &view.thresholds)
}

const fn band_color(band: Option<ReadingBand>) -> Color {
    match band {
        Some(ReadingBand::Ok) => Color::Green,
        Some(ReadingBand::Warn) => Color::Yellow,
        Some(ReadingBand::Alert) => Color::Red,
        None => Color::Gray,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_screen_tabs(frame, state, chunks[0]);
    render_filter_line(frame, state, view_data, chunks[1]);
    let ui = view_data.screen_ui(state.active_screen);
    frame.render_widget(Paragraph::new(status_tab_line(ui)), chunks[2]);
    render_table(frame, ui, chunks[3]);
    render_status_line(frame, state, chunks[4]);

    if let Some(form) = &view_data.form {
        render_form_overlay(frame, form);
    }
    if let Some(detail) = &view_data.detail {
        render_detail_overlay(frame, detail);
    }
    if let Some(org_detail) = &view_data.org_detail {
        render_org_detail_overlay(frame, org_detail);
    }
}

fn render_screen_tabs(frame: &mut ratatui::Frame<'_>, state: &AppState, area: Rect) {
    let titles: Vec<&str> = ScreenKind::ALL.iter().map(|screen| screen.label()).collect();
    let selected = ScreenKind::ALL
        .iter()
        .position(|screen| *screen == state.active_screen)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("ozopool"))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn render_filter_line(
    frame: &mut ratatui::Frame<'_>,
    state: &AppState,
    view_data: &ViewData,
    area: Rect,
) {
    let ui = view_data.screen_ui(state.active_screen);
    let search_marker = if state.mode == AppMode::Search { "|" } else { "" };
    let line = format!(
        "search: {}{search_marker}  category: {}",
        ui.list.search_term(),
        ui.list.category_filter(),
    );
    frame.render_widget(Paragraph::new(line), area);
}

fn render_table(frame: &mut ratatui::Frame<'_>, ui: &ScreenUiState, area: Rect) {
    let headers = header_labels(&ui.list);
    let column_count = headers.len().max(1);
    let rows = visible_rows(ui);
    let cursor = if rows.is_empty() {
        usize::MAX
    } else {
        ui.cursor.min(rows.len() - 1)
    };

    let header_row = Row::new(
        headers
            .into_iter()
            .map(|label| Cell::from(label).style(Style::default().add_modifier(Modifier::BOLD))),
    );
    let body = rows.into_iter().enumerate().map(|(index, row)| {
        let style = if index == cursor {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(row.cells.into_iter().map(Cell::from)).style(style)
    });

    let widths = vec![Constraint::Ratio(1, column_count as u32); column_count];
    let table = Table::new(body, widths)
        .header(header_row)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_status_line(frame: &mut ratatui::Frame<'_>, state: &AppState, area: Rect) {
    let text = state.status_line.clone().unwrap_or_else(|| {
        "/ search  c category  t status  a add  e edit  x action  enter detail  ^q quit".to_owned()
    });
    frame.render_widget(Paragraph::new(text), area);
}

fn render_form_overlay(frame: &mut ratatui::Frame<'_>, form: &FormUiState) {
    let area = centered_rect(frame.area(), 50, (form.fields.len() + 4) as u16);
    frame.render_widget(Clear, area);

    let mut lines = Vec::with_capacity(form.fields.len());
    for (index, field) in form.fields.iter().enumerate() {
        let marker = if index == form.cursor { ">" } else { " " };
        lines.push(format!("{marker} {}: {}", field.label, field.value));
    }
    let title = match form.editing {
        Some(_) => "edit (enter to save, esc to cancel)",
        None => "add (enter to save, esc to cancel)",
    };
    let paragraph = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn render_detail_overlay(frame: &mut ratatui::Frame<'_>, detail: &DetailUiState) {
    let area = centered_rect(frame.area(), 56, 14);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line<'_>> = Vec::new();
    lines.push(Line::from(format!(
        "health: {}   power: {}",
        detail_health(&detail.view).as_str(),
        if detail.view.snapshot.power { "on" } else { "off" },
    )));
    for (label, value, band) in reading_rows(&detail.view) {
        let badge = match band {
            Some(ReadingBand::Ok) => "ok",
            Some(ReadingBand::Warn) => "warn",
            Some(ReadingBand::Alert) => "ALERT",
            None => "-",
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{label:<12} {value:>10}  ")),
            Span::styled(badge, Style::default().fg(band_color(band))),
        ]));
    }
    lines.push(Line::from(""));
    for (index, device) in ControlDevice::ALL.into_iter().enumerate() {
        lines.push(Line::from(format!(
            "{} {} [{}]",
            index + 1,
            device.label(),
            if detail.equipment_on[index] { "on" } else { "off" },
        )));
    }

    let title = format!("device {} (esc to close)", detail.device_id);
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

/// Text lines for the organization card: header, contact, device
/// rollup, then the nested sub-organizations, users, and devices.
fn organization_detail_lines(view: &OrganizationDetailView) -> Vec<String> {
    let organization = &view.organization;
    let mut lines = vec![
        format!(
            "{} ({})  {}",
            organization.organization_name, organization.customer_type, organization.status,
        ),
        format!("contact: {}  {}", organization.contact_name, organization.email),
        format!(
            "devices: {} total, {} active, {} need attention",
            view.total_devices, view.active_devices, view.need_attention,
        ),
        String::new(),
        format!("sub-organizations ({})", view.sub_organizations.len()),
    ];
    for sub in &view.sub_organizations {
        lines.push(format!("  {} [{}]", sub.organization_name, sub.status));
    }
    lines.push(format!("users ({})", view.users.len()));
    for user in &view.users {
        lines.push(format!("  {} <{}> [{}]", user.username, user.email, user.status));
    }
    lines.push(format!("devices ({})", view.devices.len()));
    for device in &view.devices {
        lines.push(format!("  {} [{}]", device.device_id, device.pool_status));
    }
    lines
}

fn render_org_detail_overlay(frame: &mut ratatui::Frame<'_>, view: &OrganizationDetailView) {
    let lines = organization_detail_lines(view);
    let height = (lines.len() as u16).saturating_add(2).min(22);
    let area = centered_rect(frame.area(), 64, height);
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines.join("\n")).block(
        Block::default()
            .borders(Borders::ALL)
            .title("organization (esc to close)"),
    );
    frame.render_widget(paragraph, area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
