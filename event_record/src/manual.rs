/*!

This is the long-form manual for `event_record` and `eventintake`.

## Input formats

The following document types are accepted, identified by their declared content type:
* `application/vnd.openxmlformats-officedocument.spreadsheetml.sheet` Excel workbook (`.xlsx`)
* `application/vnd.ms-excel` Excel workbook (legacy `.xls`, or `.xlsx` sent with the older type)
* `application/pdf` PDF report

Any other content type is rejected by the router. Through the upload path, a rejected
or unreadable document is replaced by the sample event.

### Workbooks

The workbook is read sheet by sheet. These sheets are used, and a missing sheet is the same as an
empty one:

| sheet | contributes |
|---|---|
| `Attendees` | `expected_attendance`: one person per non-empty row |
| `Gate_Capacity` | `gates`: one gate per non-empty row |
| `Event_Timeline` | `event_start_datetime` (earliest start), `event_end_datetime` (latest end), name and venue from the first row |
| `Transport_Schedule` | `transport_schedule`: one arrival per non-empty row |
| `Facilities` | `facilities`: one facility per non-empty row |

The first row of a sheet holds the column names. Names are trimmed, lower-cased and spaces become
underscores, so `Gate ID` and `gate_id` are the same column. Each canonical field accepts several
column names, tried in order:

| entity | field | columns |
|---|---|---|
| gate | `gate_id` | `gate_id`, `id`, `gate` |
| gate | `gate_name` | `gate_name`, `name` (default `Gate <gate_id>`) |
| gate | `capacity_per_hour` | `capacity_per_hour`, `capacity`, `throughput` |
| gate | `gps` | `gps`, `coordinates` |
| transport | `transport_type` | `transport`, `transport_type`, `type`, `mode` |
| transport | `stop_name` | `stop_name`, `stop`, `station` |
| transport | `arrival_datetime` | `arrival`, `arrival_time`, `arrival_datetime` |
| transport | `est_capacity` | `capacity`, `est_capacity` |
| facility | `type` | `type`, `category` (lower-cased) |
| facility | `name` | `name`, `facility_name` |
| facility | `capacity` | `capacity` |
| facility | `location` | `location`, `area` |
| timeline | start | `start`, `start_datetime`, `start_time`, `starttime` |
| timeline | end | `end`, `end_datetime`, `end_time`, `endtime` |
| timeline | event name | `event_name`, `name` |
| timeline | venue | `venue`, `location`, `location_name` |

Numbers that cannot be read become `0`. Text is trimmed.

### PDF reports

Only the scalar fields are read from a PDF, from labeled lines:

```text
Event Name: Harbour Lights Festival
Venue: Marina Bay
Attendance: 12000
Start Time: 2025-10-10 19:30
End Time: 2025-10-10 23:00
```

`Location` can be used instead of `Venue`, and `Start`/`End` may be followed by `Datetime` or
`Time`.
Gates, transport and facilities are always empty for this format.

## Dates and times

Timestamps are reported in ISO-8601 (`2025-10-10T19:30:00`). Spreadsheet date cells, spreadsheet
date numbers, and the usual written layouts (`2025-10-10 19:30`, `10/10/2025 7:30 PM`,
`October 10, 2025`) are understood. A value that cannot be read is reported as an empty string.

## Fallback

When a document cannot be used at all, the upload returns the sample event
(see [crate::sample::sample_event]) together with a message explaining why.

*/
